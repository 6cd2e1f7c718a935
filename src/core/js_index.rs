use crate::domain::model::{GeneratedModule, ModuleSymbols};
use crate::utils::error::{BuildError, Result};
use std::collections::HashSet;
use std::path::Path;

const JS_MODULE_SUFFIX: &str = "_pb.js";
const EXPORT_CALL: &str = "goog.exportSymbol(";

/// 從一行產生的 JS 取出匯出的符號名稱
///
/// 只接受以 `goog.exportSymbol('proto.<namespace>.` 開頭的行，回傳引號內
/// 路徑的最後一段，例如 `proto.mlens.v1.Run.Status` -> `Status`。
pub fn parse_export_line(line: &str, namespace: &str) -> Option<String> {
    let prefix = format!("{}'proto.{}.", EXPORT_CALL, namespace);
    let rest = line.strip_prefix(&prefix)?;
    let path = rest.split('\'').next()?;
    let symbol = path.rsplit('.').next()?;
    if symbol.is_empty() {
        return None;
    }
    Some(symbol.to_string())
}

/// 列出 `*_pb.js`，依檔名排序
pub fn list_js_modules(package_dir: &Path) -> Result<Vec<GeneratedModule>> {
    let mut modules = Vec::new();
    for entry in std::fs::read_dir(package_dir)? {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && file_name.ends_with(JS_MODULE_SUFFIX) {
            let name = file_name.trim_end_matches(".js").to_string();
            modules.push(GeneratedModule::new(name, path));
        }
    }
    modules.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(modules)
}

/// 掃描單一模組；有 exportSymbol 呼叫卻沒有任何符合 namespace 的行，代表產生器格式改變
pub fn scan_js_module(module: &GeneratedModule, namespace: &str) -> Result<ModuleSymbols> {
    let content = std::fs::read_to_string(&module.path)?;

    let mut saw_export_call = false;
    let mut symbols = Vec::new();
    for line in content.lines() {
        if line.contains(EXPORT_CALL) {
            saw_export_call = true;
        }
        if let Some(symbol) = parse_export_line(line, namespace) {
            symbols.push(symbol);
        }
    }

    if saw_export_call && symbols.is_empty() {
        return Err(BuildError::FormatDrift {
            file: module.path.clone(),
            message: format!(
                "found {} calls but none for namespace proto.{}",
                EXPORT_CALL, namespace
            ),
        });
    }

    tracing::debug!("{}: {} exported symbols", module.name, symbols.len());
    Ok(ModuleSymbols {
        module: module.name.clone(),
        symbols,
    })
}

pub fn scan_js_modules(package_dir: &Path, namespace: &str) -> Result<Vec<ModuleSymbols>> {
    list_js_modules(package_dir)?
        .iter()
        .map(|module| scan_js_module(module, namespace))
        .collect()
}

pub fn render_index_js(modules: &[ModuleSymbols]) -> String {
    let mut content = String::new();

    for module in modules.iter().filter(|m| !m.symbols.is_empty()) {
        let mut names: Vec<&str> = module.symbols.iter().map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();
        content.push_str(&format!(
            "const {{ {} }} = require('./{}');\n",
            names.join(", "),
            module.module
        ));
    }

    content.push('\n');

    // 保留首次出現的順序並去除重複
    let mut seen = HashSet::new();
    let exports: Vec<&str> = modules
        .iter()
        .flat_map(|m| m.symbols.iter())
        .map(String::as_str)
        .filter(|name| seen.insert(*name))
        .collect();

    content.push_str("module.exports = {\n");
    content.push_str(&format!("  {}\n", exports.join(", ")));
    content.push_str("};\n");
    content
}

/// 產生 `index.js`，每次都完整覆寫
pub fn generate_index_js(
    package_dir: &Path,
    index_path: &Path,
    namespace: &str,
) -> Result<Vec<ModuleSymbols>> {
    tracing::info!("Generating index.js:");
    let modules = scan_js_modules(package_dir, namespace)?;
    std::fs::write(index_path, render_index_js(&modules))?;
    tracing::info!("Generated index.js successfully");
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn symbols(module: &str, names: &[&str]) -> ModuleSymbols {
        ModuleSymbols {
            module: module.to_string(),
            symbols: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_export_line() {
        assert_eq!(
            parse_export_line("goog.exportSymbol('proto.mlens.v1.Foo', null, global);", "mlens.v1"),
            Some("Foo".to_string())
        );
        assert_eq!(
            parse_export_line(
                "goog.exportSymbol('proto.mlens.v1.Run.Status', null, global);",
                "mlens.v1"
            ),
            Some("Status".to_string())
        );
        assert_eq!(
            parse_export_line("goog.exportSymbol('proto.other.v1.Foo', null, global);", "mlens.v1"),
            None
        );
        assert_eq!(
            parse_export_line("  goog.exportSymbol('proto.mlens.v1.Foo', null, global);", "mlens.v1"),
            None
        );
        assert_eq!(parse_export_line("var jspb = require('google-protobuf');", "mlens.v1"), None);
        assert_eq!(
            parse_export_line("goog.exportSymbol('proto.mlens.v1.', null, global);", "mlens.v1"),
            None
        );
    }

    #[test]
    fn test_render_groups_and_orders() {
        let modules = vec![
            symbols("a_pb", &["Zed", "Alpha", "Zed"]),
            symbols("b_pb", &["Beta", "Alpha"]),
        ];

        let content = render_index_js(&modules);
        assert_eq!(
            content,
            "const { Alpha, Zed } = require('./a_pb');\n\
             const { Alpha, Beta } = require('./b_pb');\n\
             \n\
             module.exports = {\n  Zed, Alpha, Beta\n};\n"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_index_js(&[]), "\nmodule.exports = {\n  \n};\n");
    }

    #[test]
    fn test_generate_index_js() {
        let temp_dir = TempDir::new().unwrap();
        let package_dir = temp_dir.path();
        std::fs::write(
            package_dir.join("b_pb.js"),
            "goog.exportSymbol('proto.mlens.v1.Bar', null, global);\n",
        )
        .unwrap();
        std::fs::write(
            package_dir.join("a_pb.js"),
            "var goog = jspb;\ngoog.exportSymbol('proto.mlens.v1.Foo', null, global);\n",
        )
        .unwrap();
        std::fs::write(package_dir.join("a_pb2.py"), "").unwrap();

        let index_path = package_dir.join("index.js");
        let modules = generate_index_js(package_dir, &index_path, "mlens.v1").unwrap();

        assert_eq!(modules.len(), 2);
        let content = std::fs::read_to_string(&index_path).unwrap();
        assert_eq!(
            content,
            "const { Foo } = require('./a_pb');\nconst { Bar } = require('./b_pb');\n\nmodule.exports = {\n  Foo, Bar\n};\n"
        );
    }

    #[test]
    fn test_namespace_drift_fails_loudly() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("a_pb.js"),
            "goog.exportSymbol('proto.mlens.v2.Foo', null, global);\n",
        )
        .unwrap();

        let err = scan_js_modules(temp_dir.path(), "mlens.v1").unwrap_err();
        assert!(matches!(err, BuildError::FormatDrift { .. }));
    }

    #[test]
    fn test_module_without_exports_is_tolerated() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("empty_pb.js"), "// no messages\n").unwrap();

        let modules = scan_js_modules(temp_dir.path(), "mlens.v1").unwrap();
        assert_eq!(modules.len(), 1);
        assert!(modules[0].symbols.is_empty());
    }
}
