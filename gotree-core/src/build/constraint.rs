// gotree-core/src/build/constraint.rs
//! Build constraint expressions, both `//go:build` and legacy `// +build`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn eval<F>(&self, has_tag: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        match self {
            Expr::Tag(tag) => has_tag(tag),
            Expr::Not(inner) => !inner.eval(has_tag),
            Expr::And(lhs, rhs) => lhs.eval(has_tag) && rhs.eval(has_tag),
            Expr::Or(lhs, rhs) => lhs.eval(has_tag) || rhs.eval(has_tag),
        }
    }

    fn and(lhs: Expr, rhs: Expr) -> Expr {
        Expr::And(Box::new(lhs), Box::new(rhs))
    }

    fn or(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Or(Box::new(lhs), Box::new(rhs))
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Parses the expression of a `//go:build` line.
pub fn parse_go_build(text: &str) -> Result<Expr, String> {
    let mut parser = ExprParser {
        tokens: tokenize(text)?,
        pos: 0,
    };
    if parser.tokens.is_empty() {
        return Err("empty //go:build expression".to_string());
    }
    let expr = parser.or_expr()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some(tok) => Err(format!("unexpected {tok:?} in //go:build expression")),
    }
}

/// Combines legacy `// +build` lines: options on a line are OR'd, comma
/// separated terms are AND'd, and the lines themselves are AND'd. Returns
/// `None` when there is nothing to evaluate.
pub fn parse_plus_build(lines: &[String]) -> Result<Option<Expr>, String> {
    let mut result: Option<Expr> = None;
    for line in lines {
        let mut line_expr: Option<Expr> = None;
        for option in line.split_whitespace() {
            let mut option_expr: Option<Expr> = None;
            for term in option.split(',') {
                let term_expr = match term.strip_prefix('!') {
                    Some(tag) => Expr::Not(Box::new(plus_build_tag(tag)?)),
                    None => plus_build_tag(term)?,
                };
                option_expr = Some(match option_expr {
                    Some(prev) => Expr::and(prev, term_expr),
                    None => term_expr,
                });
            }
            if let Some(option_expr) = option_expr {
                line_expr = Some(match line_expr {
                    Some(prev) => Expr::or(prev, option_expr),
                    None => option_expr,
                });
            }
        }
        let Some(line_expr) = line_expr else {
            continue;
        };
        result = Some(match result {
            Some(prev) => Expr::and(prev, line_expr),
            None => line_expr,
        });
    }
    Ok(result)
}

fn plus_build_tag(tag: &str) -> Result<Expr, String> {
    if tag.is_empty() || !tag.chars().all(is_tag_char) {
        return Err(format!("invalid +build tag '{tag}'"));
    }
    Ok(Expr::Tag(tag.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Tag(String),
    Not,
    And,
    Or,
    LParen,
    RParen,
}

fn tokenize(text: &str) -> Result<Vec<Tok>, String> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Tok::LParen),
            ')' => tokens.push(Tok::RParen),
            '!' => tokens.push(Tok::Not),
            '&' | '|' => {
                if chars.next_if(|&(_, next)| next == c).is_none() {
                    return Err(format!("invalid syntax at '{c}' (offset {i})"));
                }
                tokens.push(if c == '&' { Tok::And } else { Tok::Or });
            }
            c if is_tag_char(c) => {
                let mut tag = String::from(c);
                while let Some((_, next)) = chars.next_if(|&(_, next)| is_tag_char(next)) {
                    tag.push(next);
                }
                tokens.push(Tok::Tag(tag));
            }
            other => return Err(format!("invalid character '{other}' (offset {i})")),
        }
    }
    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl ExprParser {
    fn eat(&mut self, tok: &Tok) -> bool {
        if self.tokens.get(self.pos) == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Result<Expr, String> {
        let mut expr = self.and_expr()?;
        while self.eat(&Tok::Or) {
            expr = Expr::or(expr, self.and_expr()?);
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<Expr, String> {
        let mut expr = self.not_expr()?;
        while self.eat(&Tok::And) {
            expr = Expr::and(expr, self.not_expr()?);
        }
        Ok(expr)
    }

    fn not_expr(&mut self) -> Result<Expr, String> {
        if self.eat(&Tok::Not) {
            return Ok(Expr::Not(Box::new(self.not_expr()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, String> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        match tok {
            Some(Tok::LParen) => {
                let expr = self.or_expr()?;
                if !self.eat(&Tok::RParen) {
                    return Err("missing close paren".to_string());
                }
                Ok(expr)
            }
            Some(Tok::Tag(tag)) => Ok(Expr::Tag(tag)),
            Some(other) => Err(format!("unexpected {other:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(set: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |tag: &str| set.iter().any(|t| *t == tag)
    }

    #[test]
    fn precedence_and_parens() {
        let expr = parse_go_build("linux && amd64 || darwin").unwrap();
        assert!(expr.eval(&tags(&["linux", "amd64"])));
        assert!(expr.eval(&tags(&["darwin"])));
        assert!(!expr.eval(&tags(&["linux"])));

        let expr = parse_go_build("linux && (amd64 || arm64)").unwrap();
        assert!(expr.eval(&tags(&["linux", "arm64"])));
        assert!(!expr.eval(&tags(&["darwin", "arm64"])));
    }

    #[test]
    fn negation() {
        let expr = parse_go_build("!cgo && !(windows || plan9)").unwrap();
        assert!(expr.eval(&tags(&["linux"])));
        assert!(!expr.eval(&tags(&["linux", "cgo"])));
        assert!(!expr.eval(&tags(&["windows"])));
        let expr = parse_go_build("!!go1.18").unwrap();
        assert!(expr.eval(&tags(&["go1.18"])));
    }

    #[test]
    fn malformed_go_build() {
        for bad in ["", "linux &", "linux & amd64", "(linux", "linux)", "a || || b", "a-b"] {
            assert!(parse_go_build(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn plus_build_lines() {
        let lines = vec!["linux,amd64 darwin".to_string(), "!ignore".to_string()];
        let expr = parse_plus_build(&lines).unwrap().unwrap();
        assert!(expr.eval(&tags(&["linux", "amd64"])));
        assert!(expr.eval(&tags(&["darwin"])));
        assert!(!expr.eval(&tags(&["linux"])));
        assert!(!expr.eval(&tags(&["darwin", "ignore"])));
    }

    #[test]
    fn plus_build_edge_cases() {
        assert_eq!(parse_plus_build(&[]).unwrap(), None);
        assert_eq!(parse_plus_build(&[String::new()]).unwrap(), None);
        assert!(parse_plus_build(&["!!linux".to_string()]).is_err());
        assert!(parse_plus_build(&["linux,".to_string()]).is_err());
    }
}
