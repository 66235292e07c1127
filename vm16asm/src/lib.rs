//! Two-pass macro assembler for the [vm16](../vm16/index.html) virtual CPU.
//!
//! The main entry points are [`assemble`](fn.assemble.html), which reads a
//! root source file (and everything it includes) through a
//! [`Filesystem`](trait.Filesystem.html), and
//! [`assemble_str`](fn.assemble_str.html), which assembles a single
//! in-memory source. Both return an [`Assembly`](struct.Assembly.html):
//! the encoded token stream, the symbol and alias tables, the located
//! [`MemoryImage`](struct.MemoryImage.html) and any overlap warnings. The
//! writers in [`output`](output/index.html) serialize an assembly to the
//! COM, H16, listing, constant-table and hex-dump formats.
//!
//! # VM16 Assembly Language
//!
//! Source is line-oriented. A `;` starts a comment that runs to the end of
//! the line; commas between operands are optional.
//!
//! ## Directives
//!
//!  Directive | Effect
//! -----------|-----------------------------------------------------------
//! `.code`    | Switch to the code segment (the default).
//! `.data`    | Switch to the data segment: each number literal emits one word.
//! `.text`    | Switch to the word-text segment: each character of a quoted string emits one word.
//! `.ctext`   | Switch to the packed-text segment: character pairs pack into words, high byte first.
//! `.org <n>` | Set the emit address.
//!
//! Number literals are `$HEX`, `0xHEX`, octal (leading `0`) or decimal.
//! Quoted strings understand the `\n` and `\0` escapes.
//!
//! ## Preprocessor
//!
//! `$include "<path>"` splices another file in place; a file that was
//! already included (same basename) is skipped. `$macro <name> [<n>]` up to
//! `$endmacro` defines a macro with `<n>` parameters whose body is inserted
//! wherever a line starts with `<name>`, with `%1`..`%9` replaced by the
//! invocation's arguments. Expansion is textual and single-level: the
//! produced lines are not scanned for further invocations.
//!
//! ## Labels, aliases and namespaces
//!
//! `<ident>:` defines a label at the current address, optionally followed
//! by an instruction on the same line. `<ident> = <value>` defines an
//! alias that is substituted textually wherever the identifier appears as
//! an operand. Every label and alias lives in the namespace of its file
//! (the basename without extension): `loop` inside `main.asm` is really
//! `main.loop`. A bare identifier that names an included file resolves to
//! that file's `start` label, which is defined automatically when the file
//! first enters `.code`. A dotted `a.b` refers into namespace `a`.
//!
//! ## Operands
//!
//!  Syntax            | Meaning
//! -------------------|--------------------------------------------------
//! `A` .. `SP`        | Register (`A`, `B`, `C`, `D`, `X`, `Y`, `PC`, `SP`).
//! `[X]`, `[Y]`       | Register-indirect.
//! `[X]+`, `[Y]+`     | Register-indirect with post-increment.
//! `[SP+<n>]`         | Stack-relative.
//! `#<value>`         | Immediate constant (`#0` and `#1` encode in-slot).
//! `#<ident>`         | Immediate symbol address.
//! `+<n>` / `-<n>`    | PC-relative offset.
//! `+<ident>` / `-<ident>` | PC-relative branch to a symbol. The offset is computed from the symbol address alone; the written sign carries no meaning.
//! `<value>`          | Absolute address.
//! `<ident>`          | Absolute symbol address.
//!
//! Branch targets of the jump instructions (`jump`, `call`, `bnze`, `bze`,
//! `bpos`, `bneg`, `dbnz`) written as a bare identifier or number are
//! treated as immediate.

pub mod error;
pub mod locater;
pub mod output;
pub mod parser;
pub mod pass1;
pub mod pass2;
pub mod symbols;
pub mod tokenizer;

#[cfg(test)]
mod test;

use std::path::Path;

pub use crate::error::{Error, LineErrorKind, Result};
pub use crate::locater::{MemoryImage, Warning};
pub use crate::pass1::{Body, Token};
pub use crate::symbols::{AliasTable, SymbolTable};
pub use crate::tokenizer::{DiskFs, Filesystem, MemFs};

use crate::pass1::Pass1;
use crate::pass2::Pass2;
use crate::tokenizer::Tokenizer;

/// Everything a successful assembly produces.
#[derive(Debug)]
pub struct Assembly {
    /// The fully encoded token stream, for the listing writer.
    pub tokens: Vec<Token>,
    pub symbols: SymbolTable,
    pub aliases: AliasTable,
    pub image: MemoryImage,
    pub warnings: Vec<Warning>,
}

/// Assembles the program rooted at `path`, resolving includes relative to
/// its directory.
pub fn assemble(fs: &dyn Filesystem, path: &Path) -> Result<Assembly> {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let filename = match path.file_name().and_then(|name| name.to_str()) {
        Some(filename) => filename,
        None => return Err(Error::File(path.to_path_buf())),
    };

    let mut tokenizer = Tokenizer::new(fs);
    let lines = tokenizer.load(dir, filename)?;
    let namespaces = tokenizer.into_namespaces();

    let mut pass1 = Pass1::new(&namespaces);
    let tokens = pass1.run(&lines)?;
    let (symbols, aliases) = pass1.into_tables();

    let pass2 = Pass2::new(&namespaces, &symbols, &aliases);
    let tokens = pass2.run(tokens)?;

    let (image, warnings) = locater::locate(&tokens);
    Ok(Assembly {
        tokens,
        symbols,
        aliases,
        image,
        warnings,
    })
}

/// Assembles a single in-memory source under the given file name.
pub fn assemble_str(name: &str, source: &str) -> Result<Assembly> {
    let mut fs = MemFs::new();
    fs.insert(name, source);
    assemble(&fs, Path::new(name))
}
