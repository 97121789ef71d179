//! Seed content for a freshly initialized space.

/// Areas of Focus starter file (20,000 ft horizon).
pub const AREAS_OF_FOCUS: &str = r"# Areas of Focus

Areas of Focus are the ongoing roles and responsibilities you maintain.
Unlike projects they have no end point; they need continuous attention
and balance.

## My Areas of Focus

- **Health & Fitness**
- **Family & Relationships**
- **Professional Responsibilities**
- **Finances**

## Review Questions

- Which areas are thriving? Which need more attention?
- Are all my projects aligned with these areas?
";

/// Goals starter file (30,000 ft horizon).
pub const GOALS: &str = r"# Goals

Goals are specific achievements for the next 1-2 years. They give your
projects direction.

## My Goals

- [ ] Define your first 1-2 year goal here

## Review Schedule

Review quarterly to assess progress and adjust as needed.
";

/// Vision starter file (40,000 ft horizon).
pub const VISION: &str = r"# Vision

Your 3-5 year vision: a vivid picture of where you want to be,
aspirational yet achievable.

## Life Snapshot

*Imagine it is 3-5 years from now and you are living your ideal life.
Describe what you see.*
";

/// Purpose & Principles starter file (50,000 ft horizon).
pub const PURPOSE: &str = r"# Purpose & Principles

Why do you do what you do, and what standards do you hold while doing
it? Everything below the 50,000 ft horizon should serve this.

## My Purpose

## My Principles
";
