//! Lowering of the built-in routine surface.
//!
//! Built-in calls expand inline against the runtime prologue rather
//! than to ordinary function calls. Statement-shaped built-ins (I/O,
//! inc/dec, new/dispose, file and CRT procedures) write lines directly;
//! value-shaped ones render to an expression string.

use tpc_par::{Expr, ExprKind};
use tpc_sem::Builtin;

use crate::error::{CodeGenError, Result};

use super::CppEmitter;

impl<'a> CppEmitter<'a> {
    /// Lowers a builtin in statement position.
    pub(crate) fn builtin_stmt(&mut self, builtin: Builtin, args: &[Expr]) -> Result<()> {
        let arity = match builtin {
            Builtin::Inc | Builtin::Dec | Builtin::New | Builtin::Dispose | Builtin::Reset
            | Builtin::Rewrite | Builtin::Append | Builtin::Close => 1,
            Builtin::Str | Builtin::Assign | Builtin::Seek => 2,
            Builtin::Val | Builtin::Insert | Builtin::Delete | Builtin::BlockRead
            | Builtin::BlockWrite => 3,
            _ => 0,
        };
        if args.len() < arity {
            return Err(CodeGenError::Internal(format!(
                "{:?} expects at least {} arguments",
                builtin, arity
            )));
        }

        match builtin {
            Builtin::Write | Builtin::Writeln => self.emit_write(builtin, args),
            Builtin::Read | Builtin::Readln => self.emit_read(builtin, args),

            Builtin::Inc | Builtin::Dec => {
                let op = if builtin == Builtin::Inc { "+=" } else { "-=" };
                let target = self.expr(&args[0])?;
                let step = match args.get(1) {
                    Some(step) => self.expr(step)?,
                    None => "1".to_string(),
                };
                self.line(format!("{} {} {};", target, op, step));
                Ok(())
            }

            Builtin::New => {
                let target = self.expr(&args[0])?;
                let pointee = self.pointee_cpp(&args[0])?;
                self.line(format!("{} = new {}();", target, pointee));
                Ok(())
            }
            Builtin::Dispose => {
                let target = self.expr(&args[0])?;
                self.line(format!("delete {};", target));
                Ok(())
            }

            Builtin::Halt => {
                let code = match args.first() {
                    Some(code) => self.expr(code)?,
                    None => "0".to_string(),
                };
                self.line(format!("std::exit({});", code));
                Ok(())
            }
            Builtin::Exit => {
                let line = self.current_exit_return();
                self.line(line);
                Ok(())
            }

            Builtin::Randomize => {
                self.line("pascal_randomize();");
                Ok(())
            }

            Builtin::Val => {
                let args3 = self.render_args(args)?;
                self.line(format!(
                    "pascal_val(pascal_str({}), {}, {});",
                    args3[0], args3[1], args3[2]
                ));
                Ok(())
            }
            Builtin::Str => {
                // str(x[:w[:p]], s) - the width suffix is dropped.
                let value = match &args[0].kind {
                    ExprKind::Formatted { value, .. } => self.expr(value)?,
                    _ => self.expr(&args[0])?,
                };
                let target = self.expr(&args[1])?;
                self.line(format!("pascal_str_proc({}, {});", value, target));
                Ok(())
            }

            Builtin::Insert => {
                let rendered = self.render_args(args)?;
                self.line(format!(
                    "pascal_insert(pascal_str({}), {}, {});",
                    rendered[0], rendered[1], rendered[2]
                ));
                Ok(())
            }
            Builtin::Delete => {
                let rendered = self.render_args(args)?;
                self.line(format!(
                    "pascal_delete({}, {}, {});",
                    rendered[0], rendered[1], rendered[2]
                ));
                Ok(())
            }

            Builtin::Assign => {
                let file = self.expr(&args[0])?;
                let name = self.expr(&args[1])?;
                self.line(format!("{}.assign(pascal_str({}));", file, name));
                Ok(())
            }
            Builtin::Reset
            | Builtin::Rewrite
            | Builtin::Append
            | Builtin::Close => {
                let method = match builtin {
                    Builtin::Reset => "reset",
                    Builtin::Rewrite => "rewrite",
                    Builtin::Append => "append",
                    _ => "close",
                };
                let file = self.expr(&args[0])?;
                self.line(format!("{}.{}();", file, method));
                Ok(())
            }
            Builtin::Seek => {
                let file = self.expr(&args[0])?;
                let pos = self.expr(&args[1])?;
                self.line(format!("{}.seek({});", file, pos));
                Ok(())
            }
            Builtin::BlockRead | Builtin::BlockWrite => {
                let method = if builtin == Builtin::BlockRead {
                    "blockread"
                } else {
                    "blockwrite"
                };
                let rendered = self.render_args(args)?;
                let rest = rendered[1..].join(", ");
                self.line(format!("{}.{}({});", rendered[0], method, rest));
                Ok(())
            }

            Builtin::ClrScr => self.simple_proc("pascal_clrscr", args),
            Builtin::ClrEol => self.simple_proc("pascal_clreol", args),
            Builtin::GotoXY => self.simple_proc("pascal_gotoxy", args),
            Builtin::TextColor => self.simple_proc("pascal_textcolor", args),
            Builtin::TextBackground => self.simple_proc("pascal_textbackground", args),
            Builtin::HighVideo => self.simple_proc("pascal_highvideo", args),
            Builtin::LowVideo => self.simple_proc("pascal_lowvideo", args),
            Builtin::NormVideo => self.simple_proc("pascal_normvideo", args),
            Builtin::Delay => self.simple_proc("pascal_delay", args),
            Builtin::Sound => self.simple_proc("pascal_sound", args),
            Builtin::NoSound => self.simple_proc("pascal_nosound", args),
            Builtin::GetDate => self.simple_proc("pascal_getdate", args),
            Builtin::GetTime => self.simple_proc("pascal_gettime", args),

            // Value-shaped builtins used as statements.
            _ => {
                let rendered = self.builtin_expr(builtin, args)?;
                self.line(format!("{};", rendered));
                Ok(())
            }
        }
    }

    /// Lowers a builtin in expression position.
    pub(crate) fn builtin_expr(&self, builtin: Builtin, args: &[Expr]) -> Result<String> {
        let rendered = self.render_args(args)?;
        let arg = |i: usize| -> Result<&String> {
            rendered.get(i).ok_or_else(|| {
                CodeGenError::Internal(format!("missing argument {} to {:?}", i, builtin))
            })
        };

        Ok(match builtin {
            Builtin::Length => format!("pascal_length({})", arg(0)?),
            Builtin::Chr => format!("static_cast<char>({})", arg(0)?),
            Builtin::Ord => format!("static_cast<int>({})", arg(0)?),
            Builtin::Pos => format!("pascal_pos(pascal_str({}), pascal_str({}))", arg(0)?, arg(1)?),
            Builtin::Copy => format!(
                "pascal_copy(pascal_str({}), {}, {})",
                arg(0)?,
                arg(1)?,
                arg(2)?
            ),
            Builtin::Concat => {
                let parts: Vec<String> = rendered
                    .iter()
                    .map(|r| format!("pascal_str({})", r))
                    .collect();
                format!("({})", parts.join(" + "))
            }
            Builtin::Trim => format!("pascal_trim(pascal_str({}))", arg(0)?),
            Builtin::UpperCase => format!("pascal_uppercase(pascal_str({}))", arg(0)?),
            Builtin::LowerCase => format!("pascal_lowercase(pascal_str({}))", arg(0)?),
            Builtin::StringOfChar => format!("pascal_stringofchar({}, {})", arg(0)?, arg(1)?),
            Builtin::LeftStr => format!("pascal_leftstr(pascal_str({}), {})", arg(0)?, arg(1)?),
            Builtin::RightStr => format!("pascal_rightstr(pascal_str({}), {})", arg(0)?, arg(1)?),
            Builtin::PadLeft => format!("pascal_padleft(pascal_str({}), {})", arg(0)?, arg(1)?),
            Builtin::PadRight => format!("pascal_padright(pascal_str({}), {})", arg(0)?, arg(1)?),
            Builtin::UpCase => format!("pascal_upcase({})", arg(0)?),

            Builtin::Abs => format!("std::abs({})", arg(0)?),
            Builtin::Sqr => format!("pascal_sqr({})", arg(0)?),
            Builtin::Sqrt => format!("std::sqrt({})", arg(0)?),
            Builtin::Sin => format!("std::sin({})", arg(0)?),
            Builtin::Cos => format!("std::cos({})", arg(0)?),
            Builtin::Tan => format!("std::tan({})", arg(0)?),
            Builtin::ArcTan => format!("std::atan({})", arg(0)?),
            Builtin::Ln => format!("std::log({})", arg(0)?),
            Builtin::Exp => format!("std::exp({})", arg(0)?),
            Builtin::Power => format!("std::pow({}, {})", arg(0)?, arg(1)?),
            Builtin::Round => format!("pascal_round({})", arg(0)?),
            Builtin::Trunc => format!("static_cast<int>({})", arg(0)?),

            Builtin::IntToStr => format!("pascal_inttostr({})", arg(0)?),
            Builtin::FloatToStr => format!("pascal_floattostr({})", arg(0)?),
            Builtin::StrToInt => format!("pascal_strtoint(pascal_str({}))", arg(0)?),
            Builtin::StrToFloat => format!("pascal_strtofloat(pascal_str({}))", arg(0)?),

            Builtin::ParamCount => "pascal_paramcount()".to_string(),
            Builtin::ParamStr => format!("pascal_paramstr({})", arg(0)?),
            Builtin::Random => match rendered.first() {
                Some(bound) => format!("pascal_random({})", bound),
                None => "pascal_random()".to_string(),
            },

            Builtin::Eof => match rendered.first() {
                Some(file) => format!("{}.eof()", file),
                None => "pascal_eof_stdin()".to_string(),
            },
            Builtin::FilePos => format!("{}.filepos()", arg(0)?),
            Builtin::FileSize => format!("{}.filesize()", arg(0)?),
            Builtin::IoResult => "pascal_ioresult_take()".to_string(),

            Builtin::KeyPressed => "pascal_keypressed()".to_string(),
            Builtin::ReadKey => "pascal_readkey()".to_string(),
            Builtin::WhereX => "pascal_wherex()".to_string(),
            Builtin::WhereY => "pascal_wherey()".to_string(),

            other => {
                return Err(CodeGenError::Internal(format!(
                    "{:?} cannot appear in an expression",
                    other
                )))
            }
        })
    }

    /// write/writeln to the console or a file, with `:width:precision`
    /// formatting.
    fn emit_write(&mut self, builtin: Builtin, args: &[Expr]) -> Result<()> {
        if self.first_arg_is_file(args) {
            let file = self.expr(&args[0])?;
            for arg in &args[1..] {
                let value = match &arg.kind {
                    ExprKind::Formatted { value, .. } => self.write_value(value)?,
                    _ => self.write_value(arg)?,
                };
                self.line(format!("{}.write({});", file, value));
            }
            if builtin == Builtin::Writeln {
                self.line(format!("{}.write(\"\\n\");", file));
            }
            return Ok(());
        }

        for arg in args {
            match &arg.kind {
                ExprKind::Formatted {
                    value,
                    width,
                    precision,
                } => {
                    let value_s = self.write_value(value)?;
                    let width_s = self.expr(width)?;
                    match precision {
                        Some(precision) => {
                            let precision_s = self.expr(precision)?;
                            self.line(format!(
                                "pascal_write({}, {}, {});",
                                value_s, width_s, precision_s
                            ));
                        }
                        None => self.line(format!("pascal_write({}, {});", value_s, width_s)),
                    }
                }
                _ => {
                    let value_s = self.write_value(arg)?;
                    self.line(format!("pascal_write({});", value_s));
                }
            }
        }
        if builtin == Builtin::Writeln {
            self.line("pascal_newline();");
        }
        Ok(())
    }

    /// read/readln from the console or a file.
    fn emit_read(&mut self, builtin: Builtin, args: &[Expr]) -> Result<()> {
        if self.first_arg_is_file(args) {
            let file = self.expr(&args[0])?;
            for arg in &args[1..] {
                let target = self.expr(arg)?;
                self.line(format!("{}.read({});", file, target));
            }
            if builtin == Builtin::Readln {
                self.line(format!("{}.skip_line();", file));
            }
            return Ok(());
        }

        for arg in args {
            let target = self.expr(arg)?;
            self.line(format!("pascal_read({});", target));
        }
        if builtin == Builtin::Readln {
            // Skip to end of line, unless a string read already
            // consumed it.
            let last_is_string = args
                .last()
                .and_then(|a| self.ty_of(a))
                .map(|t| t.is_string_like())
                .unwrap_or(false);
            if !last_is_string {
                self.line("pascal_readln_flush();");
            }
        }
        Ok(())
    }

    fn simple_proc(&mut self, name: &str, args: &[Expr]) -> Result<()> {
        let rendered = self.render_args(args)?;
        self.line(format!("{}({});", name, rendered.join(", ")));
        Ok(())
    }

    fn render_args(&self, args: &[Expr]) -> Result<Vec<String>> {
        args.iter().map(|a| self.expr(a)).collect()
    }
}
