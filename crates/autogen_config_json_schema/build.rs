use std::env;
use std::fs::File;
use std::io::*;

use schemars::schema_for;
use usergraph_lib::config::Config;

fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=../usergraph_lib/src/config.rs");

    let out_path = env::current_dir()?.join("schema.json");
    let mut f = File::create(&out_path)?;

    let schema = schema_for!(Config);
    let json = serde_json::to_string_pretty(&schema).map_err(Error::other)?;
    f.write_all(json.as_bytes())?;

    Ok(())
}
