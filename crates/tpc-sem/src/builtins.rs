//! Registry of the built-in routine surface (System, CRT and DOS).
//!
//! Each built-in is identified once, here. The analyser asks the
//! registry for the result-type rule; the emitter matches on the
//! [`Builtin`] enum for its lowering. Names are case-insensitive.

use crate::types::DataType;

/// Every built-in routine the compiler knows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    // Output / input
    Write,
    Writeln,
    Read,
    Readln,

    // Strings
    Length,
    Chr,
    Ord,
    Pos,
    Copy,
    Concat,
    Insert,
    Delete,
    Trim,
    UpperCase,
    LowerCase,
    StringOfChar,
    LeftStr,
    RightStr,
    PadLeft,
    PadRight,
    UpCase,

    // Numeric
    Abs,
    Sqr,
    Sqrt,
    Sin,
    Cos,
    Tan,
    ArcTan,
    Ln,
    Exp,
    Power,
    Round,
    Trunc,

    // Conversions
    Val,
    Str,
    IntToStr,
    FloatToStr,
    StrToInt,
    StrToFloat,

    // Environment / control
    ParamCount,
    ParamStr,
    Halt,
    Exit,
    Random,
    Randomize,
    Inc,
    Dec,
    New,
    Dispose,

    // Files
    Assign,
    Reset,
    Rewrite,
    Append,
    Close,
    Eof,
    BlockRead,
    BlockWrite,
    FilePos,
    FileSize,
    Seek,
    IoResult,

    // CRT
    ClrScr,
    ClrEol,
    GotoXY,
    WhereX,
    WhereY,
    TextColor,
    TextBackground,
    HighVideo,
    LowVideo,
    NormVideo,
    Delay,
    KeyPressed,
    ReadKey,
    Sound,
    NoSound,

    // DOS
    GetDate,
    GetTime,
}

/// Looks a name up in the registry, case-insensitively.
pub fn lookup(name: &str) -> Option<Builtin> {
    Some(match name.to_ascii_lowercase().as_str() {
        "write" => Builtin::Write,
        "writeln" => Builtin::Writeln,
        "read" => Builtin::Read,
        "readln" => Builtin::Readln,
        "length" => Builtin::Length,
        "chr" => Builtin::Chr,
        "ord" => Builtin::Ord,
        "pos" => Builtin::Pos,
        "copy" => Builtin::Copy,
        "concat" => Builtin::Concat,
        "insert" => Builtin::Insert,
        "delete" => Builtin::Delete,
        "trim" => Builtin::Trim,
        "uppercase" => Builtin::UpperCase,
        "lowercase" => Builtin::LowerCase,
        "stringofchar" => Builtin::StringOfChar,
        "leftstr" => Builtin::LeftStr,
        "rightstr" => Builtin::RightStr,
        "padleft" => Builtin::PadLeft,
        "padright" => Builtin::PadRight,
        "upcase" => Builtin::UpCase,
        "abs" => Builtin::Abs,
        "sqr" => Builtin::Sqr,
        "sqrt" => Builtin::Sqrt,
        "sin" => Builtin::Sin,
        "cos" => Builtin::Cos,
        "tan" => Builtin::Tan,
        "arctan" => Builtin::ArcTan,
        "ln" => Builtin::Ln,
        "exp" => Builtin::Exp,
        "power" => Builtin::Power,
        "round" => Builtin::Round,
        "trunc" => Builtin::Trunc,
        "val" => Builtin::Val,
        "str" => Builtin::Str,
        "inttostr" => Builtin::IntToStr,
        "floattostr" => Builtin::FloatToStr,
        "strtoint" => Builtin::StrToInt,
        "strtofloat" => Builtin::StrToFloat,
        "paramcount" => Builtin::ParamCount,
        "paramstr" => Builtin::ParamStr,
        "halt" => Builtin::Halt,
        "exit" => Builtin::Exit,
        "random" => Builtin::Random,
        "randomize" => Builtin::Randomize,
        "inc" => Builtin::Inc,
        "dec" => Builtin::Dec,
        "new" => Builtin::New,
        "dispose" => Builtin::Dispose,
        "assign" => Builtin::Assign,
        "reset" => Builtin::Reset,
        "rewrite" => Builtin::Rewrite,
        "append" => Builtin::Append,
        "close" => Builtin::Close,
        "eof" => Builtin::Eof,
        "blockread" => Builtin::BlockRead,
        "blockwrite" => Builtin::BlockWrite,
        "filepos" => Builtin::FilePos,
        "filesize" => Builtin::FileSize,
        "seek" => Builtin::Seek,
        "ioresult" => Builtin::IoResult,
        "clrscr" => Builtin::ClrScr,
        "clreol" => Builtin::ClrEol,
        "gotoxy" => Builtin::GotoXY,
        "wherex" => Builtin::WhereX,
        "wherey" => Builtin::WhereY,
        "textcolor" => Builtin::TextColor,
        "textbackground" => Builtin::TextBackground,
        "highvideo" => Builtin::HighVideo,
        "lowvideo" => Builtin::LowVideo,
        "normvideo" => Builtin::NormVideo,
        "delay" => Builtin::Delay,
        "keypressed" => Builtin::KeyPressed,
        "readkey" => Builtin::ReadKey,
        "sound" => Builtin::Sound,
        "nosound" => Builtin::NoSound,
        "getdate" => Builtin::GetDate,
        "gettime" => Builtin::GetTime,
        _ => return None,
    })
}

impl Builtin {
    /// Variadic built-ins bypass arity and argument type checks.
    pub fn is_variadic(self) -> bool {
        matches!(
            self,
            Builtin::Write | Builtin::Writeln | Builtin::Read | Builtin::Readln | Builtin::Concat
        )
    }

    /// Result type, given the (already typed) argument types. Most
    /// built-ins have a fixed result; a few follow their argument.
    pub fn result_type(self, args: &[DataType]) -> DataType {
        match self {
            Builtin::Write
            | Builtin::Writeln
            | Builtin::Read
            | Builtin::Readln
            | Builtin::Insert
            | Builtin::Delete
            | Builtin::Val
            | Builtin::Str
            | Builtin::Halt
            | Builtin::Exit
            | Builtin::Randomize
            | Builtin::Inc
            | Builtin::Dec
            | Builtin::New
            | Builtin::Dispose
            | Builtin::Assign
            | Builtin::Reset
            | Builtin::Rewrite
            | Builtin::Append
            | Builtin::Close
            | Builtin::BlockRead
            | Builtin::BlockWrite
            | Builtin::Seek
            | Builtin::ClrScr
            | Builtin::ClrEol
            | Builtin::GotoXY
            | Builtin::TextColor
            | Builtin::TextBackground
            | Builtin::HighVideo
            | Builtin::LowVideo
            | Builtin::NormVideo
            | Builtin::Delay
            | Builtin::Sound
            | Builtin::NoSound
            | Builtin::GetDate
            | Builtin::GetTime => DataType::Void,

            Builtin::Length
            | Builtin::Pos
            | Builtin::Ord
            | Builtin::Round
            | Builtin::Trunc
            | Builtin::StrToInt
            | Builtin::ParamCount
            | Builtin::FilePos
            | Builtin::FileSize
            | Builtin::IoResult
            | Builtin::WhereX
            | Builtin::WhereY => DataType::Integer,

            Builtin::Chr | Builtin::UpCase | Builtin::ReadKey => DataType::Char,

            Builtin::Copy
            | Builtin::Concat
            | Builtin::Trim
            | Builtin::UpperCase
            | Builtin::LowerCase
            | Builtin::StringOfChar
            | Builtin::LeftStr
            | Builtin::RightStr
            | Builtin::PadLeft
            | Builtin::PadRight
            | Builtin::IntToStr
            | Builtin::FloatToStr
            | Builtin::ParamStr => DataType::String,

            Builtin::Sqrt
            | Builtin::Sin
            | Builtin::Cos
            | Builtin::Tan
            | Builtin::ArcTan
            | Builtin::Ln
            | Builtin::Exp
            | Builtin::Power
            | Builtin::StrToFloat => DataType::Real,

            Builtin::Eof | Builtin::KeyPressed => DataType::Boolean,

            // abs/sqr keep their argument's numeric kind.
            Builtin::Abs | Builtin::Sqr => match args.first() {
                Some(DataType::Real) => DataType::Real,
                Some(DataType::Byte) => DataType::Integer,
                Some(DataType::Integer) => DataType::Integer,
                _ => DataType::Real,
            },

            // random(n) is an integer below n; random is a real in [0,1).
            Builtin::Random => {
                if args.is_empty() {
                    DataType::Real
                } else {
                    DataType::Integer
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("WriteLn"), Some(Builtin::Writeln));
        assert_eq!(lookup("WRITELN"), Some(Builtin::Writeln));
        assert_eq!(lookup("clrscr"), Some(Builtin::ClrScr));
        assert_eq!(lookup("no_such_thing"), None);
    }

    #[test]
    fn test_variadics() {
        assert!(Builtin::Writeln.is_variadic());
        assert!(Builtin::Concat.is_variadic());
        assert!(!Builtin::Length.is_variadic());
    }

    #[test]
    fn test_fixed_result_types() {
        assert_eq!(Builtin::Length.result_type(&[DataType::String]), DataType::Integer);
        assert_eq!(Builtin::Chr.result_type(&[DataType::Integer]), DataType::Char);
        assert_eq!(Builtin::Copy.result_type(&[]), DataType::String);
        assert_eq!(Builtin::Writeln.result_type(&[]), DataType::Void);
        assert_eq!(Builtin::Eof.result_type(&[]), DataType::Boolean);
    }

    #[test]
    fn test_abs_follows_argument() {
        assert_eq!(Builtin::Abs.result_type(&[DataType::Integer]), DataType::Integer);
        assert_eq!(Builtin::Abs.result_type(&[DataType::Real]), DataType::Real);
        assert_eq!(Builtin::Sqr.result_type(&[DataType::Byte]), DataType::Integer);
    }

    #[test]
    fn test_random_arity_switch() {
        assert_eq!(Builtin::Random.result_type(&[]), DataType::Real);
        assert_eq!(Builtin::Random.result_type(&[DataType::Integer]), DataType::Integer);
    }
}
