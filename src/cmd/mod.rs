/*!
Subcommands. One file per command, each exposing an `Args` struct and a
single `execute_*` function returning `anyhow::Result<()>`.

  serve   run the MCP server (stdio or streamable HTTP)
  list    tools / prompts / categories
  call    invoke one tool locally

Shared pieces: `subject.rs` (list subjects), `shared.rs` (parameter
parsing and schema coercion), `format.rs` (terminal output).
*/

pub mod call;
pub mod format;
pub mod list;
pub mod serve;
pub mod shared;
pub mod subject;

pub use call::{CallArgs, execute_call};
pub use list::{ListArgs, execute_list};
pub use serve::{ServeArgs, execute_serve};
