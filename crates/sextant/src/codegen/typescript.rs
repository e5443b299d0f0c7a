//! TypeScript backend.
//!
//! Emits one `<kebab-name>.ts` module per service and an `index.ts` that
//! re-exports them. Exported names are built from the service name in
//! PascalCase with a trailing `Service` dropped, so `Billing Service` and
//! `Billing` both render as:
//!
//! ```typescript
//! export interface BillingOperations {
//!   "charge": (payload: unknown) => Promise<void>;
//! }
//!
//! export interface BillingCalls {
//!   "notify": (payload: unknown) => Promise<void>;
//! }
//!
//! export const createBillingService = (
//!   operations: BillingOperations,
//!   calls: BillingCalls,
//! ) => ({ name: "Billing", operations, calls });
//! ```
//!
//! Module stems and export stems are each made unique across services, and
//! no module may take the `index` stem.
//!
//! Event names are emitted as quoted property names, so any event string is
//! kept verbatim.

use std::fmt::Write;

use crate::{
    codegen::{
        Adapter, CodegenError, GENERATED_HEADER, GeneratedFile,
        naming::{disambiguate, disambiguate_reserved, to_kebab_case, to_pascal_case},
    },
    flatten::FlatService,
};

/// Renders services as TypeScript interfaces and factories.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypescriptAdapter;

impl Adapter for TypescriptAdapter {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn generate(&self, services: &[FlatService]) -> Result<Vec<GeneratedFile>, CodegenError> {
        let mut files = Vec::with_capacity(services.len() + 1);
        let mut index = format!("// {GENERATED_HEADER}\n\n");
        let modules = disambiguate_reserved(
            &["index"],
            services.iter().map(|service| to_kebab_case(service.name())),
        );
        let stems = disambiguate(services.iter().map(|service| export_stem(service.name())));

        for ((service, module), stem) in services.iter().zip(modules).zip(stems) {
            let filename = format!("{module}.ts");
            let content = render_service(service, &stem).map_err(|err| CodegenError::Render {
                adapter: self.name(),
                filename: filename.clone(),
                message: err.to_string(),
            })?;
            files.push(GeneratedFile::for_service(service.id(), filename, content));
            index.push_str(&format!("export * from \"./{module}\";\n"));
        }

        files.push(GeneratedFile::shared("index.ts", index));
        Ok(files)
    }

    fn quote_event(&self, event: &str) -> String {
        string_literal(event)
    }
}

/// A double-quoted TypeScript string literal.
///
/// JSON string syntax is a subset of TypeScript's, so `serde_json` does the escaping.
fn string_literal(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// PascalCase name without a trailing `Service`, unless that is all there is.
fn export_stem(name: &str) -> String {
    let pascal = to_pascal_case(name);
    match pascal.strip_suffix("Service") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => pascal,
    }
}

fn render_service(service: &FlatService, stem: &str) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    writeln!(out, "// {GENERATED_HEADER}")?;
    writeln!(
        out,
        "// Service {} ({})",
        string_literal(service.name()),
        service.id()
    )?;

    write_interface(&mut out, &format!("{stem}Operations"), service.operations())?;
    write_interface(&mut out, &format!("{stem}Calls"), service.calls())?;

    writeln!(out)?;
    writeln!(out, "export const create{stem}Service = (")?;
    writeln!(out, "  operations: {stem}Operations,")?;
    writeln!(out, "  calls: {stem}Calls,")?;
    writeln!(
        out,
        ") => ({{ name: {}, operations, calls }});",
        string_literal(service.name())
    )?;
    Ok(out)
}

fn write_interface(out: &mut String, name: &str, events: &[String]) -> std::fmt::Result {
    writeln!(out)?;
    if events.is_empty() {
        writeln!(out, "export interface {name} {{}}")?;
        return Ok(());
    }

    writeln!(out, "export interface {name} {{")?;
    for event in events {
        writeln!(
            out,
            "  {}: (payload: unknown) => Promise<void>;",
            string_literal(event)
        )?;
    }
    writeln!(out, "}}")
}
