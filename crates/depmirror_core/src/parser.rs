use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_parser::Parser as OxcParser;
use oxc_span::SourceType;
use std::{fs, path::Path};

use crate::{
    constants::JS_TS_EXTENSIONS,
    error::{Error, Result},
    types::{SpecKind, Specifier},
};

/// Extracts the import specifiers of a module's source text, in source order.
///
/// The text is parsed as an ES module. Use [`extract_specifiers_from_file`]
/// to pick the source type from a file extension.
pub fn extract_specifiers(source: &str) -> Result<Vec<Specifier>> {
    extract(Path::new("<source>"), source, SourceType::default())
}

/// Reads `file` and extracts its import specifiers.
///
/// Files that are not JavaScript or TypeScript (`.json`, `.node`, ...) are
/// leaves of the graph and yield no specifiers.
pub fn extract_specifiers_from_file(file: &Path) -> Result<Vec<Specifier>> {
    let Some(st) = source_type_for(file) else {
        trace!("Not a script, no imports: {}", file.display());
        return Ok(Vec::new());
    };
    trace!("Parsing file for imports: {}", file.display());
    let src = fs::read_to_string(file).map_err(|e| Error::io("read", file, e))?;
    match extract(file, &src, st) {
        // a plain .js file may be sloppy-mode CommonJS
        Err(Error::Parse { .. }) if is_ambiguous(file) => {
            debug!("Retrying {} as a script", file.display());
            extract(file, &src, st.with_script(true))
        }
        result => result,
    }
}

fn extract(file: &Path, src: &str, st: SourceType) -> Result<Vec<Specifier>> {
    let allocator = Allocator::default();
    let ret = OxcParser::new(&allocator, src, st).parse();
    if ret.panicked {
        let message = ret
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unrecoverable syntax error".to_string());
        return Err(Error::Parse { path: file.to_path_buf(), message });
    }
    if !ret.errors.is_empty() {
        debug!("Recovered from {} syntax errors in {}", ret.errors.len(), file.display());
    }

    let mut collector = SpecifierCollector::default();
    collector.visit_program(&ret.program);

    debug!("Found {} import specifiers in {}", collector.specs.len(), file.display());
    Ok(collector.specs)
}

#[derive(Default)]
struct SpecifierCollector {
    specs: Vec<Specifier>,
}

impl SpecifierCollector {
    fn push(&mut self, request: &str, kind: SpecKind) {
        trace!("Found {:?} specifier: '{}'", kind, request);
        self.specs.push(Specifier::new(request, kind));
    }
}

impl<'a> Visit<'a> for SpecifierCollector {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        // import type { Foo } from 'bar'
        if decl.import_kind.is_type() {
            return;
        }

        // import { type Foo } from 'bar' has nothing left at runtime either,
        // while a bare `import 'side-effect'` always does
        let has_runtime_import = match &decl.specifiers {
            Some(specifiers) if !specifiers.is_empty() => specifiers.iter().any(|spec| match spec {
                ImportDeclarationSpecifier::ImportSpecifier(s) => !s.import_kind.is_type(),
                ImportDeclarationSpecifier::ImportDefaultSpecifier(_) => true,
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => true,
            }),
            _ => true,
        };

        if has_runtime_import {
            self.push(decl.source.value.as_str(), SpecKind::Static);
        }
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &decl.source
            && !decl.export_kind.is_type()
            && (decl.specifiers.is_empty()
                || decl.specifiers.iter().any(|s| !s.export_kind.is_type()))
        {
            self.push(source.value.as_str(), SpecKind::Static);
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        if !decl.export_kind.is_type() {
            self.push(decl.source.value.as_str(), SpecKind::Static);
        }
    }

    fn visit_ts_import_equals_declaration(&mut self, decl: &TSImportEqualsDeclaration<'a>) {
        // import util = require('./util')
        if let TSModuleReference::ExternalModuleReference(reference) = &decl.module_reference
            && !decl.import_kind.is_type()
        {
            self.push(reference.expression.value.as_str(), SpecKind::Require);
        }
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &call.callee
            && callee.name.as_str() == "require"
            && call.arguments.len() == 1
            && let Some(arg) = call.arguments[0].as_expression()
            && let Some(request) = literal_request(arg)
        {
            self.push(&request, SpecKind::Require);
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        if let Some(request) = literal_request(&expr.source) {
            self.push(&request, SpecKind::Dynamic);
        }
        walk::walk_import_expression(self, expr);
    }
}

/// A string literal, or a template literal without substitutions.
fn literal_request(expr: &Expression) -> Option<String> {
    match expr {
        Expression::StringLiteral(sl) => Some(sl.value.to_string()),
        Expression::TemplateLiteral(tl) if tl.expressions.is_empty() && tl.quasis.len() == 1 => {
            tl.quasis[0].value.cooked.as_ref().map(|c| c.to_string())
        }
        _ => None,
    }
}

fn is_ambiguous(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("js" | "jsx"))
}

fn source_type_for(path: &Path) -> Option<SourceType> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    if !JS_TS_EXTENSIONS.contains(&ext) {
        return None;
    }

    let mut st = SourceType::default()
        .with_jsx(matches!(ext, "tsx" | "jsx"))
        .with_typescript(matches!(ext, "ts" | "tsx" | "mts" | "cts"));

    match ext {
        "mjs" | "mts" => st = st.with_module(true),
        "cjs" | "cts" => st = st.with_script(true),
        _ => {}
    }

    Some(st)
}
