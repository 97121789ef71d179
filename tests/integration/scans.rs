//! Backlink and calendar scans over a populated space.

use crate::helpers::{init_space, write_doc};
use gtdspace::calendar::{self, CalendarSource, DateField};
use gtdspace::index::{self, HorizonKind};

#[test]
fn test_backlinks_across_horizons() {
    let space = init_space();
    let goal = write_doc(space.path(), "Horizons/Goals/Marathon.md", "# Marathon\n");
    write_doc(
        space.path(),
        "Projects/Training/Training.md",
        "# Training\n\n## Reference Index\n\n[!references:related:[\"/Horizons/Goals/Marathon.md\"]]\n",
    );
    write_doc(
        space.path(),
        "Habits/Morning Run.md",
        "# Morning Run\n\n[!goals-list:goals:[\"/Horizons/Goals/Marathon.md\"]]\n",
    );
    write_doc(space.path(), "Projects/Other/Other.md", "# Other\n");

    let all = index::find(space.path(), &goal, None);
    let names: Vec<&str> = all.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Morning Run", "Training"]);

    let habits_only = index::find(space.path(), &goal, Some(HorizonKind::Habit));
    assert_eq!(habits_only.len(), 1);
    assert_eq!(habits_only[0].kind, HorizonKind::Habit);
}

#[test]
fn test_backlinks_tolerate_legacy_escaped_payloads() {
    let space = init_space();
    let target = write_doc(space.path(), "Projects/My Plan/My Plan.md", "# My Plan\n");
    write_doc(
        space.path(),
        "Projects/Other/Other.md",
        "[!references:related:[\"/Projects/My%20Plan/My%20Plan.md\"]]\n",
    );
    let found = index::find(space.path(), &target, None);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Other");
}

#[test]
fn test_calendar_collects_due_and_focus_dates_across_space() {
    let space = init_space();
    write_doc(
        space.path(),
        "Projects/Alpha/Alpha.md",
        "# Alpha\n\n[!datetime:due_date:2025-04-10]\n[!datetime:focus_date:2025-04-08T09:00:00]\n",
    );
    write_doc(
        space.path(),
        "Projects/Beta/Beta.md",
        "# Beta\n\n[!datetime:due_date:not-a-date]\n",
    );
    // Legacy focus field name still counts: the scan migrates first.
    write_doc(
        space.path(),
        "Projects/Gamma/Gamma.md",
        "# Gamma\n\n[!datetime:focus_date_time:2025-04-09]\n",
    );

    let items = calendar::collect_space(space.path());
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].name, "Alpha");
    assert!(matches!(
        items[0].source,
        CalendarSource::Document { field: DateField::Focus, .. }
    ));
    assert_eq!(items[1].name, "Gamma");
    assert_eq!(items[2].name, "Alpha");
    assert!(items[2].all_day);
}
