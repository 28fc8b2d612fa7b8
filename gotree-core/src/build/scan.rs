//! Reads just enough of a Go source file to list its imports: the build
//! directives in the header, the package clause and the import block.
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref GO_BUILD_RE: Regex = Regex::new(r"^//go:build(?:[ \t]+(.*))?$").unwrap();
    static ref PLUS_BUILD_RE: Regex = Regex::new(r"^//[ \t]*\+build(?:[ \t]+(.*))?$").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    pub package: String,
    pub imports: Vec<String>,
    /// Expression of the `//go:build` line, if any.
    pub go_build: Option<String>,
    /// Bodies of the `// +build` lines that precede the header's last blank
    /// line.
    pub plus_build: Vec<String>,
}

pub fn scan_source(src: &str) -> Result<SourceFile, String> {
    let (go_build, plus_build) = header_directives(src)?;
    let mut lexer = Lexer::new(src);

    match lexer.next_token()? {
        Token::Ident("package") => {}
        other => return Err(format!("expected 'package', found {}", other.describe())),
    }
    let package = match lexer.next_token()? {
        Token::Ident(name) => name.to_string(),
        other => return Err(format!("expected package name, found {}", other.describe())),
    };

    let mut imports = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::Punct(';') => continue,
            Token::Ident("import") => parse_import_decl(&mut lexer, &mut imports)?,
            _ => break,
        }
    }

    Ok(SourceFile {
        package,
        imports,
        go_build,
        plus_build,
    })
}

fn parse_import_decl(lexer: &mut Lexer<'_>, imports: &mut Vec<String>) -> Result<(), String> {
    let first = lexer.next_token()?;
    if first != Token::Punct('(') {
        return parse_import_spec(lexer, first, imports);
    }
    loop {
        match lexer.next_token()? {
            Token::Punct(')') => return Ok(()),
            Token::Punct(';') => continue,
            Token::Eof => return Err("unterminated import block".to_string()),
            tok => parse_import_spec(lexer, tok, imports)?,
        }
    }
}

fn parse_import_spec(
    lexer: &mut Lexer<'_>,
    first: Token<'_>,
    imports: &mut Vec<String>,
) -> Result<(), String> {
    let path = match first {
        Token::Str(path) => path,
        // Named, dot and blank imports.
        Token::Ident(_) | Token::Punct('.') => match lexer.next_token()? {
            Token::Str(path) => path,
            other => return Err(format!("expected import path, found {}", other.describe())),
        },
        other => return Err(format!("expected import path, found {}", other.describe())),
    };
    if path.is_empty() {
        return Err("empty import path".to_string());
    }
    imports.push(path);
    Ok(())
}

/// Scans the leading comments and blank lines for build directives. Like the
/// Go toolchain, `// +build` lines only count when a blank line follows them
/// before the package clause.
fn header_directives(src: &str) -> Result<(Option<String>, Vec<String>), String> {
    let mut go_build = None;
    let mut plus_build: Vec<(usize, String)> = Vec::new();
    let mut last_blank = 0;
    let mut in_block = false;

    let src = src.strip_prefix('\u{feff}').unwrap_or(src);
    for (idx, raw) in src.lines().enumerate() {
        let line = raw.trim();
        if in_block {
            if let Some(end) = line.find("*/") {
                in_block = false;
                if !line[end + 2..].trim().is_empty() {
                    break;
                }
            }
            continue;
        }
        if line.is_empty() {
            last_blank = idx;
            continue;
        }
        if line.starts_with("//") {
            if let Some(caps) = GO_BUILD_RE.captures(line) {
                if go_build.is_some() {
                    return Err("multiple //go:build comments".to_string());
                }
                let expr = caps.get(1).map_or("", |m| m.as_str()).trim();
                go_build = Some(expr.to_string());
            } else if let Some(caps) = PLUS_BUILD_RE.captures(line) {
                let body = caps.get(1).map_or("", |m| m.as_str()).trim();
                plus_build.push((idx, body.to_string()));
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("/*") {
            match rest.find("*/") {
                Some(end) if rest[end + 2..].trim().is_empty() => continue,
                Some(_) => break,
                None => {
                    in_block = true;
                    continue;
                }
            }
        }
        break;
    }

    let plus_build = plus_build
        .into_iter()
        .filter(|(idx, _)| *idx < last_blank)
        .map(|(_, body)| body)
        .collect();
    Ok((go_build, plus_build))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Str(String),
    Punct(char),
    Eof,
}

impl Token<'_> {
    fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("'{name}'"),
            Token::Str(s) => format!("string {s:?}"),
            Token::Punct(c) => format!("'{c}'"),
            Token::Eof => "end of file".to_string(),
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        // A leading byte order mark is permitted.
        let src = src.strip_prefix('\u{feff}').unwrap_or(src);
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        let src = self.src;
        &src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skips whitespace and comments. Newlines are insignificant here since
    /// the grammar accepted below never depends on automatic semicolons.
    fn skip_trivia(&mut self) -> Result<(), String> {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                let end = rest.find('\n').unwrap_or(rest.len());
                self.pos += end;
            } else if rest.starts_with("/*") {
                let end = rest[2..]
                    .find("*/")
                    .ok_or_else(|| "comment not terminated".to_string())?;
                self.pos += end + 4;
            } else if self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            } else {
                return Ok(());
            }
        }
    }

    fn next_token(&mut self) -> Result<Token<'a>, String> {
        self.skip_trivia()?;
        let start = self.pos;
        let Some(c) = self.bump() else {
            return Ok(Token::Eof);
        };
        match c {
            '"' => self.interpreted_string().map(Token::Str),
            '`' => {
                let rest = self.rest();
                let end = rest
                    .find('`')
                    .ok_or_else(|| "raw string literal not terminated".to_string())?;
                self.pos += end + 1;
                Ok(Token::Str(rest[..end].replace('\r', "")))
            }
            c if c == '_' || c.is_alphabetic() => {
                while self.peek().is_some_and(|c| c == '_' || c.is_alphanumeric()) {
                    self.bump();
                }
                let src = self.src;
                Ok(Token::Ident(&src[start..self.pos]))
            }
            c => Ok(Token::Punct(c)),
        }
    }

    fn interpreted_string(&mut self) -> Result<String, String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err("string literal not terminated".to_string()),
                Some('"') => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, String> {
        let c = self
            .bump()
            .ok_or_else(|| "escape sequence not terminated".to_string())?;
        let simple = match c {
            'a' => Some('\u{7}'),
            'b' => Some('\u{8}'),
            'f' => Some('\u{c}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\u{b}'),
            '\\' => Some('\\'),
            '"' => Some('"'),
            _ => None,
        };
        if let Some(ch) = simple {
            return Ok(ch);
        }
        let (digits, radix) = match c {
            'x' => (2, 16),
            'u' => (4, 16),
            'U' => (8, 16),
            '0'..='7' => (2, 8),
            other => return Err(format!("unknown escape sequence '\\{other}'")),
        };
        let mut value = if radix == 8 {
            c.to_digit(8).unwrap_or(0)
        } else {
            0
        };
        for _ in 0..digits {
            let d = self
                .bump()
                .and_then(|d| d.to_digit(radix))
                .ok_or_else(|| "invalid escape sequence".to_string())?;
            value = value * radix + d;
        }
        char::from_u32(value)
            .ok_or_else(|| format!("escape sequence is invalid Unicode code point {value:#x}"))
    }
}
