//! Integration tests for loading relq.toml and mapping it onto compiler options.

use relq::compiler::{AliasStyle, Compiler};
use relq::config::{Settings, SettingsError};
use relq::query::QuerySpec;
use relq::schema::{CollectionSchema, FieldInfo, FieldType, SchemaOverview};
use relq::sql::Dialect;
use std::fs;
use std::path::PathBuf;

fn write_config(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("relq-{}-{}.toml", name, std::process::id()));
    fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_config_drives_compilation() {
    let path = write_config(
        "drives",
        r#"
[compiler]
dialect = "sqlite"
alias_style = "sequential"

[query]
default_limit = 10
max_limit = 25
"#,
    );
    let settings = Settings::load(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(settings.compiler.alias_style, AliasStyle::Sequential);
    let options = settings.compiler_options();
    assert_eq!(options.dialect, Dialect::Sqlite);

    let schema = SchemaOverview::new().with_collection(
        CollectionSchema::new("notes", "id").with_field(FieldInfo::new("id", FieldType::Integer)),
    );
    let compiler = Compiler::new(&schema).with_options(options);

    let default = compiler
        .compile_query("notes", &QuerySpec::new())
        .await
        .unwrap();
    assert!(default.to_sql(Dialect::Sqlite).ends_with("LIMIT 10"));

    let capped = compiler
        .compile_query("notes", &QuerySpec::new().with_limit(-1))
        .await
        .unwrap();
    assert!(capped.to_sql(Dialect::Sqlite).ends_with("LIMIT 25"));
}

#[test]
fn test_empty_file_uses_defaults() {
    let path = write_config("empty", "");
    let settings = Settings::load(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(settings, Settings::default());
}

#[test]
fn test_missing_env_var_is_reported() {
    let path = write_config("env", "[logging]\nlevel = \"${RELQ_UNSET_LEVEL_VAR}\"\n");
    let result = Settings::load(&path);
    fs::remove_file(&path).ok();

    assert!(matches!(result, Err(SettingsError::MissingEnvVar(ref v)) if v == "RELQ_UNSET_LEVEL_VAR"));
}
