//! Rust backend.
//!
//! Emits `src/<snake_name>.rs` per service and a `src/lib.rs` declaring the
//! modules. Service modules never take the `lib` or `main` stems. Each service module contains:
//!
//! - `SERVICE`, `OPERATIONS` and `CALLS` constants listing the declarations verbatim
//! - a `<Name>Operations` trait with one `on_<event>` handler per inbound event
//! - a `<Name>Calls` trait with one `send_<event>` method per outbound event
//!
//! Uses [`quote`] for quasi-quoting token streams and [`prettyplease`] for
//! formatting the output into idiomatic Rust.

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

use crate::{
    codegen::{
        Adapter, CodegenError, GENERATED_HEADER, GeneratedFile,
        naming::{disambiguate, disambiguate_reserved, to_pascal_case, to_snake_case},
    },
    flatten::FlatService,
};

/// Renders services as Rust traits.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustAdapter;

impl Adapter for RustAdapter {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn generate(&self, services: &[FlatService]) -> Result<Vec<GeneratedFile>, CodegenError> {
        let mut files = Vec::with_capacity(services.len() + 1);
        let mut modules = Vec::with_capacity(services.len());
        let names = disambiguate_reserved(
            &["lib", "main"],
            services.iter().map(|service| module_name(service.name())),
        );

        for (service, module) in services.iter().zip(names) {
            let filename = format!("src/{module}.rs");
            let content = self.render(&filename, service_tokens(service))?;

            files.push(GeneratedFile::for_service(service.id(), filename, content));
            modules.push(format_ident!("{}", module));
        }

        let lib = quote! {
            #(pub mod #modules;)*
        };
        files.push(GeneratedFile::shared(
            "src/lib.rs",
            self.render("src/lib.rs", lib)?,
        ));
        Ok(files)
    }

    fn quote_event(&self, event: &str) -> String {
        Literal::string(event).to_string()
    }
}

impl RustAdapter {
    fn render(&self, filename: &str, tokens: TokenStream) -> Result<String, CodegenError> {
        let syntax_tree: syn::File = syn::parse2(tokens).map_err(|err| CodegenError::Render {
            adapter: self.name(),
            filename: filename.to_string(),
            message: err.to_string(),
        })?;
        let formatted = prettyplease::unparse(&syntax_tree);
        Ok(format!("// {GENERATED_HEADER}\n\n{formatted}"))
    }
}

/// Module name for a service, avoiding Rust keywords.
fn module_name(service_name: &str) -> String {
    let snake = to_snake_case(service_name);
    if syn::parse_str::<syn::Ident>(&snake).is_ok() {
        snake
    } else {
        format!("{snake}_service")
    }
}

fn method_idents(prefix: &str, events: &[String]) -> Vec<proc_macro2::Ident> {
    let names = events
        .iter()
        .map(|event| format!("{prefix}_{}", to_snake_case(event)));
    disambiguate(names)
        .into_iter()
        .map(|name| format_ident!("{}", name))
        .collect()
}

fn service_tokens(service: &FlatService) -> TokenStream {
    let pascal = to_pascal_case(service.name());
    let operations_trait = format_ident!("{}Operations", pascal);
    let calls_trait = format_ident!("{}Calls", pascal);

    let module_doc = format!(" Service `{}` (`{}`).", service.name(), service.id());
    let name = service.name();
    let operations = service.operations();
    let calls = service.calls();

    let handlers = method_idents("on", operations)
        .into_iter()
        .zip(operations)
        .map(|(ident, event)| {
            let doc = format!(" Handle an inbound `{event}` event.");
            quote! {
                #[doc = #doc]
                fn #ident(&mut self) -> Result<(), Self::Error>;
            }
        });

    let senders = method_idents("send", calls)
        .into_iter()
        .zip(calls)
        .map(|(ident, event)| {
            let doc = format!(" Send a `{event}` event.");
            quote! {
                #[doc = #doc]
                fn #ident(&mut self) -> Result<(), Self::Error>;
            }
        });

    quote! {
        #![doc = #module_doc]

        /// Display name of this service.
        pub const SERVICE: &str = #name;

        /// Events this service receives.
        pub const OPERATIONS: &[&str] = &[#(#operations),*];

        /// Events this service sends.
        pub const CALLS: &[&str] = &[#(#calls),*];

        /// Inbound events handled by this service.
        pub trait #operations_trait {
            type Error;

            #(#handlers)*
        }

        /// Outbound events issued by this service.
        pub trait #calls_trait {
            type Error;

            #(#senders)*
        }
    }
}
