use std::fs;

use crate::ir::{
    builder::{FunctionBuilder, ModuleBuilder},
    IrType, Value,
};

use super::{backend_by_name, Backend, BackendError, TextBackend};

fn sample_module() -> crate::ir::Module {
    let mut module = ModuleBuilder::new("amostra");
    let mut builder = FunctionBuilder::new("main", IrType::I32, vec![]);
    builder.build_return(Some(Value::i32(0)));
    module.add_function(builder.finish());
    module.finish()
}

#[test]
fn test_text_backend_writes_module() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("module.ll");
    let module = sample_module();

    TextBackend.emit(&module, &path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), module.to_string());
}

#[test]
fn test_text_backend_reports_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("module.ll");

    let error = TextBackend.emit(&sample_module(), &path).unwrap_err();
    assert!(matches!(error, BackendError::Io { .. }));
    assert!(error.to_string().contains("module.ll"));
}

#[test]
fn test_backend_lookup() {
    assert_eq!(backend_by_name("text").unwrap().name(), "text");
    assert!(matches!(
        backend_by_name("wasm"),
        Err(BackendError::Unknown(name)) if name == "wasm"
    ));

    #[cfg(not(feature = "llvm"))]
    assert!(matches!(
        backend_by_name("llvm"),
        Err(BackendError::Unavailable(_))
    ));
    #[cfg(feature = "llvm")]
    assert_eq!(backend_by_name("llvm").unwrap().name(), "llvm");
}

#[cfg(feature = "llvm")]
#[test]
fn test_llvm_backend_verifies_and_prints() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("module.ll");

    super::LlvmBackend.emit(&sample_module(), &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("define i32 @main()"));
}
