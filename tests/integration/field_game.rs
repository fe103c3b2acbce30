#[cfg(test)]
mod field_game_tests {
    use std::path::PathBuf;

    use common::hal::simulator::{DisplayAction, Shown};
    use common::protocol::Course;
    use compass::CompassMode;
    use orienteering::{Field, FieldConfig};

    fn sample_field() -> FieldConfig {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("configs/field.toml");
        FieldConfig::load(path).unwrap()
    }

    fn peers(field: &Field, compass: &str) -> Vec<String> {
        field
            .compass_ledger(compass)
            .unwrap()
            .iter_in_order()
            .map(|record| format!("{}/{}", record.course, record.peer))
            .collect()
    }

    #[test]
    fn test_compasses_log_their_course_in_route_order() {
        let config = sample_field();
        let mut field = Field::new(&config).unwrap();
        field.run_until(config.duration_ms);

        assert_eq!(peers(&field, "BLUE"), vec!["1/A", "1/B", "1/D"]);
        assert_eq!(peers(&field, "RED"), vec!["2/D", "2/C", "2/A"]);
    }

    #[test]
    fn test_flags_log_their_visitors() {
        let config = sample_field();
        let mut field = Field::new(&config).unwrap();
        field.run_until(config.duration_ms);

        let lines: Vec<String> = field.report().iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "flag A: 1/BLUE 2/RED",
                "flag B: 1/BLUE",
                "flag C: 2/RED",
                "flag D: 2/RED 1/BLUE",
                "compass BLUE: 1/A 1/B 1/D",
                "compass RED: 2/D 2/C 2/A",
            ]
        );
    }

    #[test]
    fn test_runs_are_deterministic() {
        let config = sample_field();

        let mut first = Field::new(&config).unwrap();
        first.run_until(15_000);
        let mut second = Field::new(&config).unwrap();
        second.run_until(15_000);

        assert_eq!(first.report(), second.report());
    }

    #[test]
    fn test_replay_shows_checkpoints_then_navigates() {
        let config = sample_field();
        let mut field = Field::new(&config).unwrap();
        field.run_until(config.duration_ms);

        let blue = field.compass_controls("BLUE").unwrap();
        blue.clear_display_events();
        field.replay();

        let shown: Vec<String> = blue
            .display_events()
            .into_iter()
            .filter_map(|event| match event.action {
                DisplayAction::Show(Shown::Identity(peer)) => Some(peer),
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec!["A", "B", "D"]);
        assert_eq!(field.compass_mode("BLUE"), Some(CompassMode::Navigate));
        assert_eq!(field.compass_mode("RED"), Some(CompassMode::Navigate));
    }

    #[test]
    fn test_flag_operator_reviews_second_course() {
        let config = sample_field();
        let mut field = Field::new(&config).unwrap();
        field.run_until(config.duration_ms);

        let flag_a = field.flag_controls("A").unwrap();
        flag_a.clear_display_events();

        flag_a.press_a();
        field.run_until(config.duration_ms + 1_000);
        flag_a.press_b();
        field.run_until(config.duration_ms + 2_000);
        flag_a.press_a();
        field.run_until(config.duration_ms + 5_000);

        let events = flag_a.display_events();
        let scrolled: Vec<String> = events
            .iter()
            .filter_map(|event| match &event.action {
                DisplayAction::Scroll(text) => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(scrolled, vec!["RED"]);
        let second = DisplayAction::Show(Shown::Course(Course::new('2').unwrap()));
        assert!(events.iter().any(|event| event.action == second));
        assert!(field.flag_controls("NOPE").is_none());
    }

    #[test]
    fn test_out_of_range_compass_logs_nothing() {
        let text = r#"
            duration_ms = 10000

            [[flag]]
            id = "A"
            courses = ["1"]
            zone = 1

            [[compass]]
            id = "BLUE"
            course = "1"
            route = [{ at_ms = 0, zone = 2 }]
        "#;
        let mut field = Field::new(&FieldConfig::from_toml(text).unwrap()).unwrap();
        field.run_until(10_000);

        assert!(field.compass_ledger("BLUE").unwrap().is_empty());
        assert!(field.flag_ledger("A").unwrap().is_empty());
    }

    #[test]
    fn test_navigating_compass_stays_silent() {
        let text = r#"
            [[flag]]
            id = "A"
            courses = ["1"]

            [[compass]]
            id = "BLUE"
            course = "1"
            scanning = false
        "#;
        let mut field = Field::new(&FieldConfig::from_toml(text).unwrap()).unwrap();
        let controls = field.compass_controls("BLUE").unwrap();
        controls.set_heading(90.0);
        field.run_until(3_000);

        assert!(field.compass_ledger("BLUE").unwrap().is_empty());
        assert!(field.flag_ledger("A").unwrap().is_empty());
        assert!(controls
            .display_events()
            .iter()
            .any(|event| event.action == DisplayAction::Show(Shown::Needle(12))));

        // switching to scan mid-game picks the flag up
        controls.press_a();
        field.run_until(6_000);
        assert_eq!(field.compass_ledger("BLUE").unwrap().len(), 1);
        assert_eq!(field.flag_ledger("A").unwrap().len(), 1);
    }
}
