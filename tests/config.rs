// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, duration formats, and pre-flight validation.

use cutover::config::*;
use std::time::Duration;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let yaml = r#"
service: myapp
image: nginx:latest
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.service.as_str(), "myapp");
        assert_eq!(config.image.to_string(), "nginx:latest");
        assert_eq!(config.desired_count, 1);
        assert_eq!(config.container_port, 3000);
        assert_eq!(config.ports.production, 80);
        assert_eq!(config.ports.test, 8080);
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
service: myapp
image: ghcr.io/org/app:v1.2.3
desired_count: 3
container_port: 8000

rollout:
  mode: linear
  interval: 2m
  percentage: 25
  approval_wait: 30m
  termination_wait: 10m
  deadline: 3h

healthcheck:
  path: /healthz
  port: 9000
  interval: 15s
  timeout: 3s
  retries: 5

ports:
  production: 443
  test: 9443

startup_window: 4m
history: /var/lib/cutover/history.jsonl
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.desired_count, 3);
        assert_eq!(config.rollout.mode, ShiftMode::Linear);
        assert_eq!(config.rollout.interval, Duration::from_secs(120));
        assert_eq!(config.rollout.percentage, 25);
        assert_eq!(config.rollout.approval_wait, Some(Duration::from_secs(1800)));
        assert_eq!(config.rollout.termination_wait, Duration::from_secs(600));
        assert_eq!(config.rollout.deadline, Some(Duration::from_secs(3 * 3600)));
        assert_eq!(config.healthcheck.path, "/healthz");
        assert_eq!(config.healthcheck.port, Some(9000));
        assert_eq!(config.healthcheck.retries, 5);
        assert_eq!(config.startup_window, Duration::from_secs(240));
        assert!(config.history.is_some());
    }

    #[test]
    fn rollout_defaults_are_the_canary_profile() {
        let yaml = r#"
service: myapp
image: nginx:latest
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.rollout.mode, ShiftMode::Canary);
        assert_eq!(config.rollout.percentage, 50);
        assert_eq!(config.rollout.interval, Duration::from_secs(300));
        assert_eq!(config.rollout.termination_wait, Duration::from_secs(300));
        assert_eq!(config.rollout.approval_wait, None);
    }

    #[test]
    fn untagged_image_defaults_to_latest() {
        let yaml = r#"
service: myapp
image: nginx
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.image.to_string(), "nginx:latest");
    }

    #[test]
    fn invalid_service_name_is_rejected() {
        let yaml = r#"
service: "My App!"
image: nginx:latest
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }
}

mod validation {
    use super::*;

    fn base(extra: &str) -> String {
        format!("service: myapp\nimage: nginx:latest\n{extra}")
    }

    #[test]
    fn zero_percentage_is_rejected() {
        let yaml = base("rollout:\n  mode: canary\n  percentage: 0\n");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn percentage_over_hundred_is_rejected() {
        let yaml = base("rollout:\n  mode: linear\n  percentage: 150\n");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn percentage_is_irrelevant_for_all_at_once() {
        let yaml = base("rollout:\n  mode: all_at_once\n  percentage: 0\n");
        assert!(Config::from_yaml(&yaml).is_ok());
    }

    #[test]
    fn zero_interval_is_rejected_for_canary() {
        let yaml = base("rollout:\n  mode: canary\n  interval: 0s\n");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn zero_desired_count_is_rejected() {
        let yaml = base("desired_count: 0\n");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn colliding_listener_ports_are_rejected() {
        let yaml = base("ports:\n  production: 8080\n  test: 8080\n");
        assert!(Config::from_yaml(&yaml).is_err());
    }
}

mod discovery {
    use super::*;

    #[test]
    fn discover_finds_yml_then_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("cutover.yaml"),
            "service: from-yaml\nimage: nginx:latest\n",
        )
        .unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.service.as_str(), "from-yaml");

        std::fs::write(
            dir.path().join("cutover.yml"),
            "service: from-yml\nimage: nginx:latest\n",
        )
        .unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.service.as_str(), "from-yml");
    }

    #[test]
    fn discover_fails_when_nothing_present() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::discover(dir.path()).is_err());
    }

    #[test]
    fn init_template_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), Some("web"), Some("ghcr.io/org/web:v2"), false).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.service.as_str(), "web");
        assert_eq!(config.image.to_string(), "ghcr.io/org/web:v2");
        assert_eq!(config.rollout.approval_wait, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn healthcheck_port_falls_back_to_container_port() {
        let config = Config::from_yaml("service: myapp\nimage: nginx:latest\n").unwrap();
        assert_eq!(config.healthcheck_port(), 3000);

        let config = Config::from_yaml(
            "service: myapp\nimage: nginx:latest\nhealthcheck:\n  port: 9999\n",
        )
        .unwrap();
        assert_eq!(config.healthcheck_port(), 9999);
    }
}
