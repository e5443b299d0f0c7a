//! Example: Building a database through an editing session
//!
//! This example drives the same callbacks a diagram editor would, then
//! compiles the result into TypeScript under a temporary directory.

use sextant::{
    Compiler,
    codegen::Backend,
    config::{AppConfig, CodegenConfig, OutputConfig},
    model::Database,
    session::Session,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Building database through a session...\n");

    let mut session = Session::new(Database::new());

    // A diagram with two environments, created from its "add" button
    let checkout = session.on_add_diagram(Some("Checkout".to_string()));
    let web = session.on_create_environment(checkout)?;
    let billing = session.on_create_environment(checkout)?;
    session.on_edit_environment("Web", web)?;
    session.on_edit_environment("Billing", billing)?;

    // Two clicks draw a step: pick the source cell, then the target cell
    session.select(checkout, web, 0)?;
    session.select(checkout, billing, 0)?;
    session.on_edit_event(checkout, "charge", 0)?;

    session.select(checkout, billing, 1)?;
    session.select(checkout, web, 1)?;
    session.on_edit_event(checkout, "receipt", 1)?;

    let output = tempfile::tempdir()?;
    let config = AppConfig::new(
        OutputConfig::new(output.path(), "database.json"),
        CodegenConfig::new(Backend::Typescript),
    );
    let compiler = Compiler::new(config);

    let report = compiler.save(&session.snapshot())?;
    for path in report.written() {
        println!("wrote {}", path.display());
    }

    let web_module = std::fs::read_to_string(output.path().join("web.ts"))?;
    println!("\n{web_module}");

    Ok(())
}
