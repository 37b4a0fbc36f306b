//! Compilation database lookup
//!
//! Compiler flags for a source file come either from the arguments given
//! after `--` on the command line, used for every file, or from a
//! `compile_commands.json` produced by the build system.

use log::{debug, trace};
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use wb_common::ToolError;

pub const DATABASE_FILE: &str = "compile_commands.json";

/// What the AST provider needs to parse one file the way the build does
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileFlags {
    /// Flags passed through to the parser
    pub args: Vec<String>,
    /// Directory the build compiled the file in
    pub directory: Option<PathBuf>,
    /// Directories named with `-isystem`
    pub system_dirs: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct CommandObject {
    directory: String,
    file: String,
    #[serde(default)]
    arguments: Option<Vec<String>>,
    #[serde(default)]
    command: Option<String>,
}

/// One file of a `compile_commands.json`
#[derive(Debug, Clone, PartialEq)]
pub struct CompileEntry {
    directory: PathBuf,
    file: PathBuf,
    arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompilationDatabase {
    /// The same flags for every file
    Fixed(Vec<String>),
    /// Entries of a `compile_commands.json`
    Json { path: PathBuf, entries: Vec<CompileEntry> },
}

impl CompilationDatabase {
    pub fn fixed(args: Vec<String>) -> Self {
        CompilationDatabase::Fixed(args)
    }

    /// Load a `compile_commands.json`
    pub fn from_file(path: &Path) -> Result<Self, ToolError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ToolError::compile_db(format!("cannot read {}: {}", path.display(), e)))?;
        let objects: Vec<CommandObject> = serde_json::from_str(&text)
            .map_err(|e| ToolError::compile_db(format!("{}: {}", path.display(), e)))?;

        let mut entries = Vec::with_capacity(objects.len());
        for object in objects {
            let directory = PathBuf::from(&object.directory);
            let arguments = match (object.arguments, object.command) {
                (Some(arguments), _) => arguments,
                (None, Some(command)) => split_command(&command).ok_or_else(|| {
                    ToolError::compile_db(format!(
                        "{}: unterminated quote in command for {}",
                        path.display(),
                        object.file
                    ))
                })?,
                (None, None) => {
                    return Err(ToolError::compile_db(format!(
                        "{}: entry for {} has neither `arguments` nor `command`",
                        path.display(),
                        object.file
                    )))
                }
            };
            entries.push(CompileEntry {
                file: normalize(Path::new(&object.file), &directory),
                directory,
                arguments,
            });
        }

        debug!("loaded {} entries from {}", entries.len(), path.display());
        Ok(CompilationDatabase::Json {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Load `compile_commands.json` from a build directory (`-p`)
    pub fn load_from_dir(dir: &Path) -> Result<Self, ToolError> {
        let path = dir.join(DATABASE_FILE);
        if !path.is_file() {
            return Err(ToolError::compile_db(format!(
                "no {} in {}",
                DATABASE_FILE,
                dir.display()
            )));
        }
        Self::from_file(&path)
    }

    /// Search the source file's directory and its parents for a database
    pub fn autodetect(source: &Path) -> Result<Option<Self>, ToolError> {
        let cwd = std::env::current_dir()?;
        let source = normalize(source, &cwd);
        let Some(start) = source.parent() else {
            return Ok(None);
        };
        for dir in start.ancestors() {
            let candidate = dir.join(DATABASE_FILE);
            trace!("looking for {}", candidate.display());
            if candidate.is_file() {
                return Self::from_file(&candidate).map(Some);
            }
        }
        Ok(None)
    }

    /// Flags for a file, `None` if the database does not know it
    pub fn flags_for(&self, file: &Path) -> Option<CompileFlags> {
        match self {
            CompilationDatabase::Fixed(args) => {
                let (args, system_dirs) = filter_args(args, None, None);
                Some(CompileFlags {
                    args,
                    directory: None,
                    system_dirs,
                })
            }
            CompilationDatabase::Json { entries, .. } => {
                let cwd = std::env::current_dir().ok()?;
                let wanted = normalize(file, &cwd);
                let entry = entries.iter().find(|entry| entry.file == wanted)?;
                // argv[0] is the compiler
                let arguments = entry.arguments.get(1..).unwrap_or_default();
                let (args, system_dirs) = filter_args(arguments, Some(entry), Some(entry.directory.as_path()));
                Some(CompileFlags {
                    args,
                    directory: Some(entry.directory.clone()),
                    system_dirs,
                })
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            CompilationDatabase::Fixed(_) => "command line flags".to_string(),
            CompilationDatabase::Json { path, .. } => path.display().to_string(),
        }
    }
}

/// Drop the flags that only matter to a real compile (outputs, dependency
/// files, the source itself) and collect `-isystem` directories
fn filter_args(
    args: &[String],
    entry: Option<&CompileEntry>,
    directory: Option<&Path>,
) -> (Vec<String>, Vec<PathBuf>) {
    let mut kept = Vec::new();
    let mut system_dirs = Vec::new();
    let mut iter = args.iter();

    let resolve = |dir: &str| match directory {
        Some(base) => normalize(Path::new(dir), base),
        None => PathBuf::from(dir),
    };

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" | "-MD" | "-MMD" | "-M" | "-MM" | "-MP" => continue,
            "-o" | "-MF" | "-MT" | "-MQ" => {
                iter.next();
                continue;
            }
            "-isystem" => {
                if let Some(dir) = iter.next() {
                    system_dirs.push(resolve(dir));
                    kept.push(arg.clone());
                    kept.push(dir.clone());
                }
                continue;
            }
            _ => {}
        }

        if ["-o", "-MF", "-MT", "-MQ"].iter().any(|flag| arg.starts_with(flag)) {
            continue;
        }
        if let Some(dir) = arg.strip_prefix("-isystem") {
            system_dirs.push(resolve(dir));
        }
        if let Some(entry) = entry {
            if !arg.starts_with('-') && normalize(Path::new(arg), &entry.directory) == entry.file {
                continue;
            }
        }
        kept.push(arg.clone());
    }

    (kept, system_dirs)
}

/// Split a shell command line into words
///
/// Handles single quotes, double quotes and backslash escapes; returns `None`
/// for an unterminated quote.
pub fn split_command(command: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        '\'' => break,
                        c => word.push(c),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        '"' => break,
                        '\\' => match chars.next()? {
                            c @ ('"' | '\\' | '$' | '`') => word.push(c),
                            '\n' => {}
                            c => {
                                word.push('\\');
                                word.push(c);
                            }
                        },
                        c => word.push(c),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some('\n') => {}
                    Some(c) => word.push(c),
                    None => word.push('\\'),
                }
            }
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Some(words)
}

/// Make a path absolute against `base` and fold `.` and `..` without
/// touching the file system
pub fn normalize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_split_command() {
        assert_eq!(
            split_command(r#"cc -DNAME="a b" -I 'inc dir' -c gc.c"#),
            Some(strings(&["cc", "-DNAME=a b", "-I", "inc dir", "-c", "gc.c"]))
        );
        assert_eq!(
            split_command(r#"cc -DQ=\"x\" a\ b.c"#),
            Some(strings(&["cc", "-DQ=\"x\"", "a b.c"]))
        );
        assert_eq!(split_command("cc 'oops"), None);
        assert_eq!(split_command("   "), Some(vec![]));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize(Path::new("../src/./gc.c"), Path::new("/work/build")),
            PathBuf::from("/work/src/gc.c")
        );
        assert_eq!(
            normalize(Path::new("/abs/gc.c"), Path::new("/ignored")),
            PathBuf::from("/abs/gc.c")
        );
    }

    #[test]
    fn test_fixed_flags_are_filtered() {
        let db = CompilationDatabase::fixed(strings(&["-Iinclude", "-c", "-o", "gc.o", "-MD", "-isystem", "/sdk"]));
        let flags = db.flags_for(Path::new("gc.c")).unwrap();
        assert_eq!(flags.args, strings(&["-Iinclude", "-isystem", "/sdk"]));
        assert_eq!(flags.system_dirs, vec![PathBuf::from("/sdk")]);
        assert_eq!(flags.directory, None);
    }

    #[test]
    fn test_json_database_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        fs::create_dir(&build).unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();

        let json = serde_json::json!([
            {
                "directory": build.display().to_string(),
                "file": "../src/gc.c",
                "command": "cc -I../include -DRUBY_EXPORT -o gc.o -c ../src/gc.c -MF gc.d -isystem../sdk"
            },
            {
                "directory": build.display().to_string(),
                "file": src.join("array.c").display().to_string(),
                "arguments": ["clang", "-std=gnu99", "-c", src.join("array.c").display().to_string()]
            }
        ]);
        fs::write(build.join(DATABASE_FILE), json.to_string()).unwrap();

        let db = CompilationDatabase::load_from_dir(&build).unwrap();

        let gc = db.flags_for(&src.join("gc.c")).unwrap();
        assert_eq!(gc.args, strings(&["-I../include", "-DRUBY_EXPORT", "-isystem../sdk"]));
        assert_eq!(gc.directory.as_deref(), Some(build.as_path()));
        assert_eq!(gc.system_dirs, vec![dir.path().join("sdk")]);

        let array = db.flags_for(&src.join("array.c")).unwrap();
        assert_eq!(array.args, strings(&["-std=gnu99"]));

        assert!(db.flags_for(&src.join("missing.c")).is_none());
    }

    #[test]
    fn test_autodetect_searches_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(DATABASE_FILE), "[]").unwrap();

        let found = CompilationDatabase::autodetect(&nested.join("gc.c")).unwrap().unwrap();
        assert_eq!(found.describe(), dir.path().join(DATABASE_FILE).display().to_string());
    }

    #[test]
    fn test_missing_database_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = CompilationDatabase::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ToolError::CompileDb { .. }));
    }
}
