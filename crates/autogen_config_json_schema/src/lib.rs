//! Writes the JSON Schema of usergraph's configuration file to `schema.json`
//! at build time, for editor completion and validation.
