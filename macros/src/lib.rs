//! Procedural macros for the opperai crate.
//!
//! - [`schema`] prepares a type for use as a function input or output
//! - [`function`](fn@function) turns a documented fn signature into a remote function
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use opperai::{ApiKey, Opper, function, schema};
//!
//! #[schema]
//! struct Translation {
//!     text: String,
//!     language: String,
//! }
//!
//! /// Translate the input text to German.
//! #[function(model = "openai/gpt-4o")]
//! async fn translate(text: String) -> Translation;
//!
//! # async fn run() -> Result<(), opperai::OpperError> {
//! let client = Opper::new(ApiKey::Default)?;
//! let translation = translate(&client, "Good morning".to_string()).await?;
//! # Ok(()) }
//! ```

use proc_macro::TokenStream;
use quote::quote;

mod function;

/// Attribute macro for types exchanged with remote functions.
///
/// # What it does
///
/// - Adds `#[derive(Serialize, Deserialize, JsonSchema)]` through the crate's re-exports,
///   so callers need no direct `serde` or `schemars` dependency
/// - Adds `#[schemars(deny_unknown_fields)]`, making the schema sent to the server strict
///
/// # Example
///
/// ```rust
/// use opperai::schema;
///
/// #[schema]
/// struct Room {
///     /// Number of beds
///     beds: u32,
///     sea_view: bool,
/// }
/// ```
#[proc_macro_attribute]
pub fn schema(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item_tokens: proc_macro2::TokenStream = item.into();

    let expanded = quote! {
        #[derive(
            ::opperai::__private::serde::Serialize,
            ::opperai::__private::serde::Deserialize,
            ::opperai::__private::schemars::JsonSchema
        )]
        #[serde(crate = "::opperai::__private::serde")]
        #[schemars(crate = "::opperai::__private::schemars", deny_unknown_fields)]
        #item_tokens
    };

    TokenStream::from(expanded)
}

/// Declares a remote function from a documented, body-less fn signature.
///
/// The doc comment becomes the instructions, the parameter the input and the return
/// type the output. Several parameters are bundled into a generated `<Name>Args`
/// struct. The macro emits:
///
/// - `<name>_definition()` returning the [`FunctionDefinition`]
/// - a fn of the same name that takes the client first and calls the remote function.
///   `async fn` takes `&opperai::Opper`, a plain `fn` takes `&opperai::blocking::Opper`.
///
/// Every call makes sure the remote function matches the definition before invoking it.
///
/// # Options
///
/// - `name = "..."`: remote path, defaults to the fn name
/// - `model = "..."`: model identifier
/// - `description = "..."`
///
/// # Example
///
/// ```rust,no_run
/// use opperai::{blocking, ApiKey, function};
///
/// /// Count the words in the text.
/// #[function(name = "sdk/word_count")]
/// fn word_count(text: String) -> u32;
///
/// # fn run() -> Result<(), opperai::OpperError> {
/// let client = blocking::Opper::new(ApiKey::Default)?;
/// let words = word_count(&client, "one two three".to_string())?;
/// # Ok(()) }
/// ```
///
/// [`FunctionDefinition`]: ../opperai/struct.FunctionDefinition.html
#[proc_macro_attribute]
pub fn function(attr: TokenStream, item: TokenStream) -> TokenStream {
    match function::function_impl(attr.into(), item.into()) {
        Ok(output) => output.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
