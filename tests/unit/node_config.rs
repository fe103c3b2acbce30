#[cfg(test)]
mod node_config_tests {
    use std::path::PathBuf;

    use common::config::{NodeConfig, RadioSettings, Timing};
    use common::error::ConfigError;
    use common::protocol::Course;
    use compass::Compass;
    use flag::Flag;
    use orienteering::{Field, FieldConfig, FieldError};

    fn sample(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("configs").join(name)
    }

    #[test]
    fn test_sample_compass_config() {
        let config = NodeConfig::load(sample("compass.toml")).unwrap();
        let compass = Compass::from_config(&config).unwrap();

        assert_eq!(compass.id().as_str(), "BLUE");
        assert_eq!(compass.course(), Course::new('1').unwrap());
        assert_eq!(config.radio, RadioSettings::default());
        assert_eq!(config.timing, Timing::default());
    }

    #[test]
    fn test_sample_flag_config() {
        let config = NodeConfig::load(sample("flag.toml")).unwrap();
        let flag = Flag::from_config(&config).unwrap();

        let labels: String = flag.courses().iter().map(|c| c.as_char()).collect();
        assert_eq!(labels, "125");
        assert_eq!(config.timing.broadcast_pause_ms, 600);
    }

    #[test]
    fn test_flag_config_is_not_a_compass() {
        let config = NodeConfig::load(sample("flag.toml")).unwrap();
        let error = Compass::from_config(&config).unwrap_err();

        assert!(matches!(error, ConfigError::CompassCourses(3)));
        assert_eq!(
            error.to_string(),
            "a compass must be bound to exactly one course, got 3"
        );
    }

    #[test]
    fn test_sample_field_config() {
        let config = FieldConfig::load(sample("field.toml")).unwrap();

        assert_eq!(config.flags.len(), 4);
        assert_eq!(config.compasses.len(), 2);
        assert!(config.replay);
        assert!(Field::new(&config).is_ok());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            NodeConfig::load(sample("missing.toml")),
            Err(ConfigError::Io(_))
        ));
        assert!(matches!(
            FieldConfig::load(sample("missing.toml")),
            Err(FieldError::Io(_))
        ));
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        let error = NodeConfig::from_toml("id = \"A\"\ncourses = [\"1\"]\n[radio]\nchannel = 99\n")
            .unwrap_err();
        assert_eq!(error.to_string(), "radio channel must be at most 83, got 99");

        let error =
            NodeConfig::from_toml("id = \"A\"\ncourses = [\"1\", \"2\", \"1\"]\n").unwrap_err();
        assert_eq!(error.to_string(), "course 1 is listed more than once");

        let error = NodeConfig::from_toml(
            r#"
                id = "A"
                courses = ["1", "2", "3", "4", "5", "6", "7", "8", "9"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }
}
