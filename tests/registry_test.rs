use async_trait::async_trait;
use cloudsweep::domain::ports::{Scanner, Session};
use cloudsweep::{default_registry, EbsVolumeScanner, Finding, ResourceType, ScannerRegistry, SweepError};

struct NamedScanner {
    name: &'static str,
    label: &'static str,
}

#[async_trait]
impl Scanner for NamedScanner {
    fn argument_name(&self) -> &str {
        self.name
    }

    fn label(&self) -> &str {
        self.label
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::Eip
    }

    async fn scan(&self, _session: &dyn Session) -> Vec<Finding> {
        Vec::new()
    }
}

fn scanner(name: &'static str) -> NamedScanner {
    NamedScanner { name, label: "Test" }
}

#[test]
fn test_all_preserves_registration_order() {
    let mut registry = ScannerRegistry::new();
    for name in ["zeta", "alpha", "mid"] {
        registry.register(scanner(name)).unwrap();
    }

    let names: Vec<&str> = registry.names().collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    assert_eq!(registry.all().len(), 3);
    assert_eq!(registry.get("alpha").unwrap().argument_name(), "alpha");
    assert!(registry.get("missing").is_none());
}

#[test]
fn test_duplicate_name_is_rejected() {
    let mut registry = ScannerRegistry::new();
    registry.register(scanner("eip")).unwrap();

    let err = registry
        .register(NamedScanner {
            name: "eip",
            label: "Another",
        })
        .unwrap_err();

    assert!(matches!(err, SweepError::DuplicateScanner { ref name } if name == "eip"));
    assert!(err.is_configuration());
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("eip").unwrap().label(), "Test");
}

#[test]
fn test_select_resolves_names() {
    let mut registry = ScannerRegistry::new();
    for name in ["a", "b", "c"] {
        registry.register(scanner(name)).unwrap();
    }

    assert_eq!(registry.select(&[]).unwrap().len(), 3);

    let picked = registry
        .select(&["c".to_string(), "a".to_string(), "c".to_string()])
        .unwrap();
    let names: Vec<&str> = picked.iter().map(|s| s.argument_name()).collect();
    assert_eq!(names, vec!["c", "a"]);

    let err = registry.select(&["nope".to_string()]).err().unwrap();
    assert!(matches!(err, SweepError::UnknownScanner { .. }));
}

#[test]
fn test_default_registry_contains_builtin_scanners() {
    let registry = default_registry(30).unwrap();
    let ebs = registry.get(EbsVolumeScanner::ARGUMENT_NAME).unwrap();
    assert_eq!(ebs.label(), "EBS Volumes");
    assert_eq!(ebs.resource_type(), ResourceType::EbsVolumes);
}
