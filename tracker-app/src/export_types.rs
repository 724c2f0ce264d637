use anyhow::{Result, anyhow};
use specta_typescript::{BigIntExportBehavior, Typescript};
use tracker_app_lib::mk_specta;

/// Next to the page that calls the commands, relative to `tracker-app/`
const DEFAULT_PATH: &str = "../dist/bindings.ts";

const HEADER: &str = "// Tracker commands and events, regenerate with `cargo run --bin export-types`
/* eslint @typescript-eslint/no-unused-vars: 0 */
/* eslint @typescript-eslint/no-explicit-any: 0 */";

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PATH.to_string());

    // Nothing exported should need a bigint, fail loudly if that changes
    let lang = Typescript::default()
        .header(HEADER)
        .bigint(BigIntExportBehavior::Fail);

    mk_specta()
        .export(lang, &path)
        .map_err(|why| anyhow!("Failed to export bindings to {path}: {why}"))?;

    println!("Exported tracker bindings to {path}");
    Ok(())
}
