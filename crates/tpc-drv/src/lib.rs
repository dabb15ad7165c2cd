//! tpc-drv - Compiler driver.
//!
//! Orchestrates the pipeline over one program: read the source, lex,
//! parse, analyse, emit the C++ translation unit, invoke the host
//! toolchain, clean up. Each phase reports into the shared diagnostic
//! handler; a later phase never runs once an earlier one has errors.
//!
//! The library entry [`compile_to_cpp`] runs the front end over a
//! source string without touching the filesystem or the toolchain,
//! which is what the integration tests use.

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use tpc_gen::Toolchain;
use tpc_par::{Module, Parser};
use tpc_sem::{SemanticAnalyzer, UnitLoader};
use tpc_util::{Handler, SourceMap, Span, Stage};

/// Driver configuration, populated from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input `.pas` file.
    pub input: PathBuf,

    /// Output executable path; defaults to the input with the host
    /// executable suffix.
    pub output: Option<PathBuf>,

    /// Retain the intermediate translation unit.
    pub keep_cpp: bool,

    /// Verbose progress to stderr.
    pub verbose: bool,

    /// Print the token stream to stdout and stop (debug).
    pub dump_tokens: bool,

    /// Print the AST to stdout and stop (debug).
    pub dump_ast: bool,
}

/// Terminal driver outcome; diagnostics carry the detail.
#[derive(Debug, Error)]
pub enum DriverError {
    /// One or more diagnostics were errors.
    #[error("compilation failed")]
    Failed,
}

/// One compilation: fresh sources, fresh handler, fresh symbol table.
pub struct Session {
    pub config: Config,
    pub sources: SourceMap,
    pub handler: Handler,
}

impl Session {
    /// Creates a session for the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sources: SourceMap::new(),
            handler: Handler::new(),
        }
    }

    /// Runs the pipeline. Diagnostics accumulate in `self.handler`;
    /// the caller prints them.
    pub fn compile(&mut self) -> Result<(), DriverError> {
        debug!("reading {}", self.config.input.display());
        let file_id = match self.sources.load_file(&self.config.input) {
            Ok(id) => id,
            Err(err) => {
                self.handler
                    .error(Stage::Driver, err.to_string(), Span::DUMMY);
                return Err(DriverError::Failed);
            }
        };

        debug!("lexing");
        let source = &self.sources.get(file_id).expect("just loaded").content;
        let tokens = tpc_lex::tokenize(source, &self.handler, file_id);

        if self.config.dump_tokens {
            for token in &tokens {
                println!(
                    "{}:{} {:?} {:?}",
                    token.span.line, token.span.column, token.kind, token.lexeme
                );
            }
            return self.finish();
        }

        debug!("parsing");
        let mut parser = Parser::new(tokens, &self.handler);
        let module = parser.parse_module();
        let node_count = parser.node_count();

        if self.config.dump_ast {
            println!("{:#?}", module);
            return self.finish();
        }

        if self.handler.has_errors() {
            return Err(DriverError::Failed);
        }

        debug!("analysing");
        let loader = UnitLoader::new(UnitLoader::default_search_dirs(&self.config.input));
        let mut analyzer =
            SemanticAnalyzer::new(&self.handler, loader, &mut self.sources, node_count);
        analyzer.analyze_module(&module);
        let (analysis, _table) = analyzer.finish();

        if self.handler.has_errors() {
            return Err(DriverError::Failed);
        }

        debug!("emitting C++");
        let cpp = match tpc_gen::emit_module(&module, &analysis) {
            Ok(cpp) => cpp,
            Err(err) => {
                self.handler
                    .error(Stage::Driver, err.to_string(), Span::DUMMY);
                return Err(DriverError::Failed);
            }
        };

        let output = self.output_path();
        let cpp_path = output.with_extension("cpp");

        if let Err(err) = std::fs::write(&cpp_path, &cpp) {
            self.handler.error(
                Stage::Driver,
                format!("failed to write {}: {}", cpp_path.display(), err),
                Span::DUMMY,
            );
            return Err(DriverError::Failed);
        }

        debug!("invoking the C++ toolchain");
        let linked = Toolchain::discover().and_then(|tc| {
            debug!("compiler: {}", tc.compiler.display());
            tc.compile(&cpp_path, &output)
        });

        if !self.config.keep_cpp {
            let _ = std::fs::remove_file(&cpp_path);
        }

        if let Err(err) = linked {
            self.handler
                .error(Stage::Driver, err.to_string(), Span::DUMMY);
            return Err(DriverError::Failed);
        }

        debug!("wrote {}", output.display());
        self.finish()
    }

    /// The executable path: `-o` or the input with the host suffix.
    pub fn output_path(&self) -> PathBuf {
        match &self.config.output {
            Some(path) => path.clone(),
            None => {
                let stem = self
                    .config
                    .input
                    .file_stem()
                    .map(|s| s.to_os_string())
                    .unwrap_or_else(|| "a".into());
                let mut name = stem;
                name.push(std::env::consts::EXE_SUFFIX);
                self.config
                    .input
                    .parent()
                    .map(|p| p.join(&name))
                    .unwrap_or_else(|| PathBuf::from(&name))
            }
        }
    }

    fn finish(&self) -> Result<(), DriverError> {
        if self.handler.has_errors() {
            Err(DriverError::Failed)
        } else {
            Ok(())
        }
    }
}

/// Runs a compilation and returns the process exit code, printing all
/// diagnostics to stderr.
pub fn run(config: Config) -> i32 {
    let mut session = Session::new(config);
    let result = session.compile();

    for diagnostic in session.handler.diagnostics() {
        eprintln!("{}", diagnostic);
    }

    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

/// Runs the front end over a source string and returns the generated
/// translation unit. Units are resolved against `search_dirs`.
pub fn compile_to_cpp(
    source: &str,
    search_dirs: Vec<PathBuf>,
    handler: &Handler,
) -> Result<String, DriverError> {
    let mut sources = SourceMap::new();
    let file_id = sources.add_file("<input>", source.to_string());
    let content = sources.get(file_id).expect("just added").content.clone();

    let tokens = tpc_lex::tokenize(&content, handler, file_id);
    let mut parser = Parser::new(tokens, handler);
    let module: Module = parser.parse_module();
    let node_count = parser.node_count();

    if handler.has_errors() {
        return Err(DriverError::Failed);
    }

    let loader = UnitLoader::new(search_dirs);
    let mut analyzer = SemanticAnalyzer::new(handler, loader, &mut sources, node_count);
    analyzer.analyze_module(&module);
    let (analysis, _table) = analyzer.finish();

    if handler.has_errors() {
        return Err(DriverError::Failed);
    }

    match tpc_gen::emit_module(&module, &analysis) {
        Ok(cpp) => Ok(cpp),
        Err(err) => {
            handler.error(Stage::Driver, err.to_string(), Span::DUMMY);
            Err(DriverError::Failed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(input: &str) -> Config {
        Config {
            input: PathBuf::from(input),
            output: None,
            keep_cpp: false,
            verbose: false,
            dump_tokens: false,
            dump_ast: false,
        }
    }

    #[test]
    fn test_default_output_path() {
        let session = Session::new(config_for("/tmp/demo.pas"));
        let expected = format!("demo{}", std::env::consts::EXE_SUFFIX);
        assert_eq!(session.output_path(), PathBuf::from("/tmp").join(expected));
    }

    #[test]
    fn test_explicit_output_path() {
        let mut config = config_for("demo.pas");
        config.output = Some(PathBuf::from("/out/prog"));
        let session = Session::new(config);
        assert_eq!(session.output_path(), PathBuf::from("/out/prog"));
    }

    #[test]
    fn test_missing_input_is_a_driver_error() {
        let mut session = Session::new(config_for("/definitely/not/here.pas"));
        assert!(session.compile().is_err());
        let diags = session.handler.diagnostics();
        assert_eq!(diags[0].stage, Stage::Driver);
    }

    #[test]
    fn test_compile_to_cpp_runs_the_front_end() {
        let handler = Handler::new();
        let cpp = compile_to_cpp(
            "program P; begin writeln('hi') end.",
            Vec::new(),
            &handler,
        )
        .expect("compilation should succeed");
        assert!(cpp.contains("int main(int argc, char* argv[])"));
        assert!(cpp.contains("pascal_write(std::string(\"hi\"));"));
    }

    #[test]
    fn test_compile_to_cpp_fails_on_semantic_error() {
        let handler = Handler::new();
        let result = compile_to_cpp("program P; begin x := 1 end.", Vec::new(), &handler);
        assert!(result.is_err());
        assert!(handler.has_errors());
    }
}
