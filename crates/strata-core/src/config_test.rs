use super::*;

#[test]
fn test_parse_minimal_config() {
    let yaml = r#"
name: test_project
schema:
  name: stareau
  version: 3
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.name, "test_project");
    assert_eq!(config.schema.name, "stareau");
    assert_eq!(config.schema.version.get(), 3);
    assert_eq!(config.database.path, "strata.duckdb");
    assert_eq!(config.install.lock_table, "strata_lock");

    let root = PathBuf::from("/tmp/test");
    assert_eq!(
        config.upgrade_dir_absolute(&root),
        root.join("install").join("sql").join("upgrade")
    );
    assert!(config.reference_dir_absolute(&root).is_none());
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
name: water
schema:
  name: stareau
  version: 7
database:
  path: "./warehouse.duckdb"
install:
  dir: setup
  scripts:
    - 00_initialize_database.sql
    - stareau/10_FUNCTION.sql
  teardown:
    schemas: [aep_brcht, aep, commun]
    types:
      - name: public.c_insee
        kind: domain
      - name: public.c_annee
  reference:
    dir: csv
    schema_suffix: valeur
targets:
  prod:
    database:
      path: prod.duckdb
    schema: water_prod
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.install.scripts.len(), 2);
    assert_eq!(config.install.teardown.schemas, vec!["aep_brcht", "aep", "commun"]);
    assert_eq!(config.install.teardown.types[0].kind, TypeKind::Domain);
    assert_eq!(config.install.teardown.types[1].kind, TypeKind::Type);

    let root = PathBuf::from("/srv/project");
    assert_eq!(
        config.reference_dir_absolute(&root),
        Some(root.join("setup").join("csv"))
    );
    assert_eq!(config.get_schema(Some("prod")).unwrap(), "water_prod");
    assert_eq!(
        config.get_database_config(Some("prod")).unwrap().path,
        "prod.duckdb"
    );
    assert_eq!(config.get_schema(None).unwrap(), "stareau");
    let reference = config.install.reference.as_ref().unwrap();
    assert_eq!(reference.columns, vec!["code", "label", "description"]);
}

#[test]
fn test_unknown_target_lists_available() {
    let yaml = r#"
name: t
schema: { name: s, version: 1 }
targets:
  dev: {}
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let err = config.get_schema(Some("staging")).unwrap_err();
    assert!(err.to_string().contains("Available targets: dev"));
}

#[test]
fn test_target_without_overrides_falls_back() {
    let yaml = r#"
name: t
schema: { name: base, version: 1 }
database: { path: base.duckdb }
targets:
  dev: {}
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.get_schema(Some("dev")).unwrap(), "base");
    assert_eq!(config.get_database_config(Some("dev")).unwrap().path, "base.duckdb");
}

#[test]
fn test_rejects_zero_version() {
    let yaml = "name: t\nschema: { name: s, version: 0 }";
    assert!(serde_yaml::from_str::<Config>(yaml).is_err());
}

#[test]
fn test_rejects_unknown_fields() {
    let yaml = "name: t\nschema: { name: s, version: 1 }\nmaterialization: view";
    assert!(serde_yaml::from_str::<Config>(yaml).is_err());
}

#[test]
fn test_load_validates_suffixes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("strata.yml"),
        "name: t\nschema: { name: s, version: 1 }\ninstall:\n  teardown:\n    schemas: [\"bad-suffix\"]\n",
    )
    .unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_load_from_dir_accepts_yaml_extension() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("strata.yaml"),
        "name: t\nschema: { name: s, version: 2 }\n",
    )
    .unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.schema.version.get(), 2);
}

#[test]
fn test_load_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_validates_reference_columns() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("strata.yml"),
        "name: t\nschema: { name: s, version: 1 }\ninstall:\n  reference:\n    dir: csv\n    schema_suffix: valeur\n    columns: [code, valeur]\n",
    )
    .unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(err.to_string().contains("exactly 3 columns"));
}
