//! Walks through the function lifecycle against a live account.
//!
//! ```sh
//! OPPER_API_KEY=... cargo run --example functions -- async
//! OPPER_API_KEY=... cargo run --example functions -- sync
//! ```
//!
//! Without an argument both modes run.

use dotenv::dotenv;
use futures::StreamExt;
use opperai::{
    ApiKey, CallOptions, Example, FunctionConfiguration, FunctionSpec, FunctionUpdate, Message,
    Opper, blocking, function, schema,
};
use tracing_subscriber::EnvFilter;

#[schema]
#[derive(Debug)]
struct MyInput {
    name: String,
}

#[schema]
#[derive(Debug)]
struct MyResponse {
    greeting: String,
}

#[schema]
#[derive(Debug)]
struct TranslateOutput {
    german: String,
    spanish: String,
    french: String,
    italian: String,
}

/// Translate the input to multiple languages
#[function(name = "rust/sdk/async-translate")]
async fn async_translate(input: String) -> TranslateOutput;

/// Translate the input to multiple languages
#[function(name = "rust/sdk/sync-translate")]
fn sync_translate(input: String) -> TranslateOutput;

fn examples() -> Result<Vec<Example>, opperai::OpperError> {
    Ok(vec![
        Example::new(
            &MyInput { name: "world".into() },
            &MyResponse { greeting: "Hello, world!".into() },
        )?,
        Example::new(
            &MyInput { name: "nick".into() },
            &MyResponse { greeting: "Hello, nick!".into() },
        )?,
    ])
}

fn world() -> MyInput {
    MyInput { name: "world".into() }
}

async fn async_crud_function(opper: &Opper) -> Result<(), Box<dyn std::error::Error>> {
    let mut function = opper
        .functions()
        .create(
            FunctionSpec::new("rust/sdk/async-crud-function", "greet the user")
                .model("openai/gpt-4o")
                .input_type::<MyInput>(),
        )
        .await?;

    let mut res = function.call_stream(&world(), CallOptions::default()).await?;
    let mut deltas = res.deltas();
    while let Some(delta) = deltas.next().await {
        print!("{}", delta?);
    }
    println!();

    let content = serde_json::to_string(&world())?;
    let mut res = function.chat_stream(vec![Message::user(content)]).await?;
    println!("{}", res.collect_text().await?);

    function
        .update(FunctionUpdate::new().output_type::<MyResponse>())
        .await?;

    let (res, _): (MyResponse, _) = function.call(&world(), CallOptions::default()).await?;
    println!("{res:?}");

    let (res, _): (MyResponse, _) = function
        .call(&world(), CallOptions::default().examples(examples()?))
        .await?;
    println!("{res:?}");

    function
        .update(
            FunctionUpdate::new()
                .instructions("greet the user in german")
                .configuration(FunctionConfiguration::with_exact_match_cache(10)),
        )
        .await?;

    let (res, meta): (MyResponse, _) = function.call(&world(), CallOptions::default()).await?;
    println!("Not cached ({}): {res:?}", meta.cached);
    let (res, meta): (MyResponse, _) = function.call(&world(), CallOptions::default()).await?;
    println!("Cached ({}): {res:?}", meta.cached);

    println!("Deleted: {}", function.delete().await?);
    Ok(())
}

fn sync_crud_function(opper: &blocking::Opper) -> Result<(), Box<dyn std::error::Error>> {
    let mut function = opper.functions().create(
        FunctionSpec::new("rust/sdk/sync-crud-function", "greet the user")
            .model("openai/gpt-4o")
            .input_type::<MyInput>(),
    )?;

    let mut res = function.call_stream(&world(), CallOptions::default())?;
    for delta in res.deltas() {
        print!("{}", delta?);
    }
    println!();

    let content = serde_json::to_string(&world())?;
    let mut res = function.chat_stream(vec![Message::user(content)])?;
    println!("{}", res.collect_text()?);

    function.update(FunctionUpdate::new().output_type::<MyResponse>())?;

    let (res, _): (MyResponse, _) = function.call(&world(), CallOptions::default())?;
    println!("{res:?}");

    let (res, _): (MyResponse, _) =
        function.call(&world(), CallOptions::default().examples(examples()?))?;
    println!("{res:?}");

    function.update(
        FunctionUpdate::new()
            .instructions("greet the user in german")
            .configuration(FunctionConfiguration::with_exact_match_cache(10)),
    )?;

    let (res, meta): (MyResponse, _) = function.call(&world(), CallOptions::default())?;
    println!("Not cached ({}): {res:?}", meta.cached);
    let (res, meta): (MyResponse, _) = function.call(&world(), CallOptions::default())?;
    println!("Cached ({}): {res:?}", meta.cached);

    println!("Deleted: {}", function.delete()?);
    Ok(())
}

fn run_async() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let opper = Opper::new(ApiKey::Default)?;
        println!("{:?}", async_translate(&opper, "hello".into()).await?);
        async_crud_function(&opper).await
    })
}

fn run_sync() -> Result<(), Box<dyn std::error::Error>> {
    let opper = blocking::Opper::new(ApiKey::Default)?;
    println!("{:?}", sync_translate(&opper, "hello".into())?);
    sync_crud_function(&opper)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match std::env::args().nth(1).as_deref() {
        Some("async") => run_async(),
        Some("sync") => run_sync(),
        Some(other) => Err(format!("unknown mode `{other}`, expected `sync` or `async`").into()),
        None => {
            run_async()?;
            run_sync()
        }
    }
}
