//! Built-in file system capabilities.

use std::fs;
use std::path::Path;

use runtime::{Capability, HandlerError, RegistrationSource};
use serde_json::{Value, json};

type HandlerResult = Result<Value, HandlerError>;

/// Capabilities declared explicitly at startup.
pub fn static_capabilities() -> Vec<Capability> {
    vec![
        Capability::new("fs.read", "Read a UTF-8 text file", fs_read).with_schema(path_schema()),
        Capability::new("fs.list", "List directory entries", fs_list).with_schema(path_schema()),
        Capability::new("fs.write", "Write a UTF-8 text file, replacing it", fs_write).with_schema(
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "content": {"type": "string"}
                },
                "required": ["path", "content"]
            }),
        ),
        Capability::new("fs.delete", "Delete a file", fs_delete).with_schema(path_schema()),
    ]
}

/// The discovered `fs` source.
///
/// `fs.exists` is marked exposable and declares itself safe. `fs.stat` is
/// merely reachable, so it is synthesized as destructive until something
/// declares otherwise.
pub fn fs_source() -> RegistrationSource {
    RegistrationSource::new("fs")
        .expose(
            Capability::new("fs.exists", "Check whether a path exists", fs_exists)
                .with_schema(path_schema())
                .destructive(false),
        )
        .reachable("fs.stat", fs_stat)
}

fn path_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"path": {"type": "string"}},
        "required": ["path"]
    })
}

fn str_arg<'a>(args: &'a Value, key: &str) -> Result<&'a str, HandlerError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError::InvalidInput(format!("missing string argument '{key}'")))
}

fn io_error(path: &str, e: std::io::Error) -> HandlerError {
    HandlerError::Execution(format!("{path}: {e}"))
}

fn fs_read(args: &Value) -> HandlerResult {
    let path = str_arg(args, "path")?;
    fs::read_to_string(path)
        .map(Value::String)
        .map_err(|e| io_error(path, e))
}

fn fs_list(args: &Value) -> HandlerResult {
    let path = str_arg(args, "path")?;
    let mut names = fs::read_dir(path)
        .map_err(|e| io_error(path, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    Ok(json!(names))
}

fn fs_write(args: &Value) -> HandlerResult {
    let path = str_arg(args, "path")?;
    let content = str_arg(args, "content")?;
    fs::write(path, content).map_err(|e| io_error(path, e))?;
    Ok(json!({"path": path, "bytes": content.len()}))
}

fn fs_delete(args: &Value) -> HandlerResult {
    let path = str_arg(args, "path")?;
    fs::remove_file(path).map_err(|e| io_error(path, e))?;
    Ok(json!({"deleted": path}))
}

fn fs_exists(args: &Value) -> HandlerResult {
    let path = str_arg(args, "path")?;
    Ok(json!(Path::new(path).exists()))
}

fn fs_stat(args: &Value) -> HandlerResult {
    let path = str_arg(args, "path")?;
    let meta = fs::metadata(path).map_err(|e| io_error(path, e))?;
    Ok(json!({
        "len": meta.len(),
        "is_dir": meta.is_dir(),
        "readonly": meta.permissions().readonly(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use runtime::{Catalog, Source};
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        let mut builder = Catalog::builder();
        builder
            .register_static(static_capabilities())
            .unwrap()
            .discover_dynamic(&[&fs_source()]);
        builder.build().unwrap()
    }

    #[test]
    fn builtin_classification() {
        let catalog = catalog();
        let destructive = |name: &str| catalog.get(name).unwrap().destructive();

        assert!(!destructive("fs.read"));
        assert!(!destructive("fs.list"));
        assert!(!destructive("fs.exists"));
        assert!(destructive("fs.write"));
        assert!(destructive("fs.delete"));
        assert!(destructive("fs.stat"));
        assert_eq!(catalog.get("fs.stat").unwrap().source, Source::Discovered);
        assert_eq!(catalog.len(), 6);
    }

    #[test]
    fn handlers_work_on_real_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("note.txt");
        let path = file.to_str().unwrap();

        fs_write(&json!({"path": path, "content": "hello"})).unwrap();
        assert_eq!(fs_read(&json!({"path": path})).unwrap(), json!("hello"));
        assert_eq!(fs_exists(&json!({"path": path})).unwrap(), json!(true));
        assert_eq!(fs_stat(&json!({"path": path})).unwrap()["len"], json!(5));
        assert_eq!(
            fs_list(&json!({"path": dir.path().to_str().unwrap()})).unwrap(),
            json!(["note.txt"])
        );

        fs_delete(&json!({"path": path})).unwrap();
        assert_eq!(fs_exists(&json!({"path": path})).unwrap(), json!(false));
        assert!(matches!(
            fs_read(&json!({"path": path})),
            Err(HandlerError::Execution(_))
        ));
    }

    #[test]
    fn missing_arguments_are_invalid_input() {
        assert!(matches!(
            fs_write(&json!({"path": "x"})),
            Err(HandlerError::InvalidInput(_))
        ));
    }
}
