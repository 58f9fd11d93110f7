//! Recursive descent parser for model definition files.

use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{Lexer, SpannedToken, Token};
use crate::span::{Span, Spanned};

/// A property modifier as written, before checking it is allowed.
#[derive(Debug, Clone, PartialEq)]
enum Modifier {
    Primary,
    Required,
    Unique,
    Many,
    Default(Spanned<Literal>),
    Label(String),
    Column(String),
    Role(String),
}

impl Modifier {
    fn keyword(&self) -> &'static str {
        match self {
            Modifier::Primary => "primary",
            Modifier::Required => "required",
            Modifier::Unique => "unique",
            Modifier::Many => "many",
            Modifier::Default(_) => "default",
            Modifier::Label(_) => "label",
            Modifier::Column(_) => "column",
            Modifier::Role(_) => "role",
        }
    }
}

const FIELD_MODIFIERS: &str = "primary, required, unique, many, default, label, column";
const ASSOCIATION_MODIFIERS: &str = "required, many, role, label";
const COMPOSITION_MODIFIERS: &str = "label";
const ALIAS_MODIFIERS: &str = "label";

/// Parser for model definition files.
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    source: &'source str,
}

impl<'source> Parser<'source> {
    /// Create a new parser for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            lexer: Lexer::new(source),
            source,
        }
    }

    /// Parse a complete model file.
    pub fn parse_file(&mut self) -> Result<ModelFile, ParseError> {
        let mut file = ModelFile::default();

        while let Some(token) = self.peek() {
            match token {
                Token::Uses => {
                    let path = self.parse_uses()?;
                    file.uses.push(path);
                }
                Token::Domain => file.domains.push(self.parse_domain()?),
                Token::Class => file.classes.push(self.parse_class()?),
                other => {
                    let tok = self.next_token()?;
                    return Err(ParseError::new(
                        format!("expected 'uses', 'domain' or 'class', found {}", other.describe()),
                        tok.span,
                    ));
                }
            }
        }

        if let Some(bad) = self.lexer.take_invalid() {
            return Err(self.invalid_input(bad));
        }

        Ok(file)
    }

    /// Parse `uses module::kind::name;`.
    fn parse_uses(&mut self) -> Result<Spanned<FileRef>, ParseError> {
        let start = self.expect_token(Token::Uses)?.span;
        let module = self.expect_ident()?;
        self.expect_token(Token::PathSep)?;
        let kind = self.expect_ident()?;
        self.expect_token(Token::PathSep)?;
        let name = self.expect_ident()?;
        self.expect_semi("write 'uses module::kind::name;'")?;

        Ok(Spanned::new(
            FileRef {
                module: module.value,
                kind: kind.value,
                name: name.value,
            },
            start.merge(name.span),
        ))
    }

    /// Parse a domain block.
    fn parse_domain(&mut self) -> Result<DomainDecl, ParseError> {
        let start = self.expect_token(Token::Domain)?.span;
        let name = self.expect_ident()?;
        self.expect_token(Token::LBrace)?;

        let mut domain = DomainDecl {
            name,
            label: None,
            length: None,
            scale: None,
            mappings: Vec::new(),
            span: start,
        };

        loop {
            let tok = self.next_token()?;
            match tok.token {
                Token::RBrace => {
                    domain.span = start.merge(tok.span);
                    return Ok(domain);
                }
                Token::Label => {
                    domain.label = Some(self.parse_string()?.value);
                    self.expect_semi("domain items end with ';'")?;
                }
                Token::Length => {
                    domain.length = Some(self.expect_size()?);
                    self.expect_semi("domain items end with ';'")?;
                }
                Token::Scale => {
                    domain.scale = Some(self.expect_size()?);
                    self.expect_semi("domain items end with ';'")?;
                }
                Token::Map => {
                    let target = self.expect_ident()?;
                    self.expect_token(Token::Assign)?;
                    let ty = self.parse_string()?;
                    if domain.mappings.iter().any(|(t, _)| t.value == target.value) {
                        return Err(ParseError::new(
                            format!("duplicate mapping for target '{}'", target.value),
                            target.span,
                        ));
                    }
                    domain.mappings.push((target, ty.value));
                    self.expect_semi("write 'map target = \"type\";'")?;
                }
                other => {
                    return Err(ParseError::new(
                        format!("unexpected {} in domain", other.describe()),
                        tok.span,
                    )
                    .with_hint("domains accept label, length, scale and map items"))
                }
            }
        }
    }

    /// Parse a class block.
    fn parse_class(&mut self) -> Result<ClassDecl, ParseError> {
        let start = self.expect_token(Token::Class)?.span;
        let name = self.expect_ident()?;
        let mut class = ClassDecl::new(name);

        if self.peek() == Some(Token::Colon) {
            self.next_token()?;
            class.extends = Some(self.expect_ident()?);
        }

        if let Some(token) = self.peek() {
            let keyword = match token {
                Token::Enum => Some(StereotypeKeyword::Enum),
                Token::Reference => Some(StereotypeKeyword::Reference),
                Token::Plain => Some(StereotypeKeyword::Plain),
                _ => None,
            };
            if let Some(keyword) = keyword {
                let tok = self.next_token()?;
                class.stereotype = Some(Spanned::new(keyword, tok.span));
            }
        }

        self.expect_token(Token::LBrace)?;

        loop {
            let tok = self.next_token()?;
            match tok.token {
                Token::RBrace => {
                    class.span = start.merge(tok.span);
                    return Ok(class);
                }
                Token::Trigram => {
                    let trigram = self.expect_ident()?;
                    Self::set_once(&mut class.trigram, trigram, "trigram")?;
                    self.expect_semi("write 'trigram ABC;'")?;
                }
                Token::Label => {
                    let property = self.expect_ident()?;
                    Self::set_once(&mut class.label_property, property, "label")?;
                    self.expect_semi("write 'label Property;'")?;
                }
                Token::Key => {
                    let property = self.expect_ident()?;
                    Self::set_once(&mut class.unique_key, property, "key")?;
                    self.expect_semi("write 'key Property;'")?;
                }
                Token::Abstract => {
                    class.is_abstract = true;
                    self.expect_semi("write 'abstract;'")?;
                }
                Token::DbOnly => {
                    class.database_only = true;
                    self.expect_semi("write 'dbonly;'")?;
                }
                Token::Field => class.properties.push(self.parse_field(tok.span)?),
                Token::Ref => class.properties.push(self.parse_association(tok.span)?),
                Token::Compose => class.properties.push(self.parse_composition(tok.span)?),
                Token::Alias => class.properties.push(self.parse_alias(tok.span)?),
                Token::Values => self.parse_rows(&mut class.rows)?,
                other => {
                    return Err(ParseError::new(
                        format!("unexpected {} in class '{}'", other.describe(), class.name.value),
                        tok.span,
                    )
                    .with_hint("expected field, ref, compose, alias, values or a class setting"))
                }
            }
        }
    }

    /// Parse `field Name: DOMAIN modifiers;` (keyword already consumed).
    fn parse_field(&mut self, start: Span) -> Result<PropertyDecl, ParseError> {
        let name = self.expect_ident()?;
        self.expect_token(Token::Colon)
            .map_err(|e| e.with_hint("write 'field Name: DOMAIN;'"))?;
        let domain = self.expect_ident()?;
        let (modifiers, end) = self.parse_modifiers()?;

        let mut field = FieldDecl {
            name,
            domain,
            primary_key: false,
            required: false,
            unique: false,
            many: false,
            default: None,
            label: None,
            column: None,
            span: start.merge(end),
        };

        for modifier in modifiers {
            match modifier.value {
                Modifier::Primary => field.primary_key = true,
                Modifier::Required => field.required = true,
                Modifier::Unique => field.unique = true,
                Modifier::Many => field.many = true,
                Modifier::Default(value) => field.default = Some(value),
                Modifier::Label(label) => field.label = Some(label),
                Modifier::Column(column) => field.column = Some(column),
                other => return Err(Self::disallowed(&other, modifier.span, "field", FIELD_MODIFIERS)),
            }
        }

        Ok(PropertyDecl::Field(field))
    }

    /// Parse `ref Name -> Target modifiers;` (keyword already consumed).
    fn parse_association(&mut self, start: Span) -> Result<PropertyDecl, ParseError> {
        let name = self.expect_ident()?;
        self.expect_token(Token::Arrow)
            .map_err(|e| e.with_hint("write 'ref Name -> Target;'"))?;
        let target = self.expect_ident()?;
        let (modifiers, end) = self.parse_modifiers()?;

        let mut association = AssociationDecl {
            name,
            target,
            role: None,
            required: false,
            many: false,
            label: None,
            span: start.merge(end),
        };

        for modifier in modifiers {
            match modifier.value {
                Modifier::Required => association.required = true,
                Modifier::Many => association.many = true,
                Modifier::Role(role) => association.role = Some(role),
                Modifier::Label(label) => association.label = Some(label),
                other => {
                    return Err(Self::disallowed(
                        &other,
                        modifier.span,
                        "association",
                        ASSOCIATION_MODIFIERS,
                    ))
                }
            }
        }

        Ok(PropertyDecl::Association(association))
    }

    /// Parse `compose Name -> Target one|many modifiers;` (keyword already consumed).
    fn parse_composition(&mut self, start: Span) -> Result<PropertyDecl, ParseError> {
        let name = self.expect_ident()?;
        self.expect_token(Token::Arrow)
            .map_err(|e| e.with_hint("write 'compose Name -> Target many;'"))?;
        let target = self.expect_ident()?;

        let multiplicity = match self.peek() {
            Some(Token::One) => {
                self.next_token()?;
                Multiplicity::One
            }
            Some(Token::Many) => {
                self.next_token()?;
                Multiplicity::Many
            }
            _ => Multiplicity::One,
        };

        let (modifiers, end) = self.parse_modifiers()?;
        let mut composition = CompositionDecl {
            name,
            target,
            multiplicity,
            label: None,
            span: start.merge(end),
        };

        for modifier in modifiers {
            match modifier.value {
                Modifier::Label(label) => composition.label = Some(label),
                other => {
                    return Err(Self::disallowed(
                        &other,
                        modifier.span,
                        "composition",
                        COMPOSITION_MODIFIERS,
                    ))
                }
            }
        }

        Ok(PropertyDecl::Composition(composition))
    }

    /// Parse `alias Class_Field[_Prefix[_Suffix]] modifiers;` (keyword already consumed).
    fn parse_alias(&mut self, start: Span) -> Result<PropertyDecl, ParseError> {
        let token = self.expect_ident()?;
        let (modifiers, end) = self.parse_modifiers()?;

        let mut alias = AliasDecl {
            token,
            label: None,
            span: start.merge(end),
        };

        for modifier in modifiers {
            match modifier.value {
                Modifier::Label(label) => alias.label = Some(label),
                other => {
                    return Err(Self::disallowed(&other, modifier.span, "alias", ALIAS_MODIFIERS)
                        .with_hint(
                            "aliases copy everything but the label from their source; \
                             use label \"[Override] ...\" to replace it",
                        ))
                }
            }
        }

        Ok(PropertyDecl::Alias(alias))
    }

    /// Parse modifiers up to and including the terminating ';'.
    fn parse_modifiers(&mut self) -> Result<(Vec<Spanned<Modifier>>, Span), ParseError> {
        let mut modifiers = Vec::new();

        loop {
            let tok = self.next_token()?;
            let modifier = match tok.token {
                Token::Semi => return Ok((modifiers, tok.span)),
                Token::Primary => Modifier::Primary,
                Token::Required => Modifier::Required,
                Token::Unique => Modifier::Unique,
                Token::Many => Modifier::Many,
                Token::Default => Modifier::Default(self.parse_literal()?),
                Token::Label => Modifier::Label(self.parse_string()?.value),
                Token::Column => Modifier::Column(self.parse_string()?.value),
                Token::Role => Modifier::Role(self.parse_string()?.value),
                other => {
                    return Err(ParseError::new(
                        format!("expected a modifier or ';', found {}", other.describe()),
                        tok.span,
                    )
                    .with_hint("property declarations end with ';'"))
                }
            };
            modifiers.push(Spanned::new(modifier, tok.span));
        }
    }

    /// Parse `values { Row { Field = literal, ... } ... }` (keyword already consumed).
    fn parse_rows(&mut self, rows: &mut Vec<RowDecl>) -> Result<(), ParseError> {
        self.expect_token(Token::LBrace)?;

        loop {
            if self.peek() == Some(Token::RBrace) {
                self.next_token()?;
                return Ok(());
            }

            let name = self.expect_ident()?;
            self.expect_token(Token::LBrace)?;
            let mut values = Vec::new();

            let end = loop {
                if self.peek() == Some(Token::RBrace) {
                    break self.next_token()?.span;
                }

                let field = self.expect_ident()?;
                self.expect_token(Token::Assign)
                    .map_err(|e| e.with_hint("write 'Field = value'"))?;
                let value = self.parse_literal()?;
                values.push((field, value));

                match self.next_token()? {
                    SpannedToken {
                        token: Token::Comma,
                        ..
                    } => continue,
                    SpannedToken {
                        token: Token::RBrace,
                        span,
                    } => break span,
                    other => {
                        return Err(ParseError::new(
                            format!("expected ',' or '}}', found {}", other.token.describe()),
                            other.span,
                        ))
                    }
                }
            };

            let span = name.span.merge(end);
            rows.push(RowDecl { name, values, span });
        }
    }

    fn disallowed(modifier: &Modifier, span: Span, kind: &str, allowed: &str) -> ParseError {
        ParseError::new(
            format!("modifier '{}' is not allowed on {} declarations", modifier.keyword(), kind),
            span,
        )
        .with_hint(format!("allowed modifiers: {}", allowed))
    }

    fn set_once(
        slot: &mut Option<Spanned<String>>,
        value: Spanned<String>,
        item: &str,
    ) -> Result<(), ParseError> {
        if slot.is_some() {
            return Err(ParseError::new(format!("duplicate '{}' setting", item), value.span));
        }
        *slot = Some(value);
        Ok(())
    }

    /// Parse a literal value.
    fn parse_literal(&mut self) -> Result<Spanned<Literal>, ParseError> {
        let tok = self.next_token()?;
        let literal = match tok.token {
            Token::Null => Literal::Null,
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
            Token::Int(i) => Literal::Int(i),
            Token::Float(f) => Literal::Float(f),
            Token::String(s) => Literal::String(s),
            other => {
                return Err(ParseError::new(
                    format!("expected literal value, found {}", other.describe()),
                    tok.span,
                ))
            }
        };

        Ok(Spanned::new(literal, tok.span))
    }

    /// Parse a string literal.
    fn parse_string(&mut self) -> Result<Spanned<String>, ParseError> {
        let tok = self.next_token()?;
        match tok.token {
            Token::String(s) => Ok(Spanned::new(s, tok.span)),
            other => Err(ParseError::new(
                format!("expected string literal, found {}", other.describe()),
                tok.span,
            )),
        }
    }

    /// Expect a non-negative integer that fits a length or scale.
    fn expect_size(&mut self) -> Result<u32, ParseError> {
        let tok = self.next_token()?;
        match tok.token {
            Token::Int(i) => u32::try_from(i).map_err(|_| {
                ParseError::new(format!("size {} is out of range", i), tok.span)
            }),
            other => Err(ParseError::new(
                format!("expected integer, found {}", other.describe()),
                tok.span,
            )),
        }
    }

    /// Expect and consume an identifier.
    fn expect_ident(&mut self) -> Result<Spanned<String>, ParseError> {
        let tok = self.next_token()?;
        match tok.token {
            Token::Ident(name) => Ok(Spanned::new(name, tok.span)),
            other => Err(ParseError::new(
                format!("expected identifier, found {}", other.describe()),
                tok.span,
            )),
        }
    }

    fn expect_semi(&mut self, hint: &str) -> Result<SpannedToken, ParseError> {
        self.expect_token(Token::Semi).map_err(|e| e.with_hint(hint))
    }

    /// Expect and consume a specific token.
    fn expect_token(&mut self, expected: Token) -> Result<SpannedToken, ParseError> {
        let tok = self.next_token()?;
        if std::mem::discriminant(&tok.token) == std::mem::discriminant(&expected) {
            Ok(tok)
        } else {
            Err(ParseError::new(
                format!("expected {}, found {}", expected.describe(), tok.token.describe()),
                tok.span,
            ))
        }
    }

    fn peek(&mut self) -> Option<Token> {
        self.lexer.peek().map(|t| t.token.clone())
    }

    /// Get the next token or error if EOF or unrecognised input was skipped.
    fn next_token(&mut self) -> Result<SpannedToken, ParseError> {
        let tok = self.lexer.next_token();
        if let Some(bad) = self.lexer.take_invalid() {
            return Err(self.invalid_input(bad));
        }
        tok.ok_or_else(|| {
            ParseError::new(
                "unexpected end of input",
                Span::new(self.source.len(), self.source.len()),
            )
        })
    }

    fn invalid_input(&self, span: Span) -> ParseError {
        let text = self.source.get(span.start..span.end).unwrap_or("");
        ParseError::new(format!("unexpected input '{}'", text), span)
    }
}

/// Parse the text of one model file.
pub fn parse(source: &str) -> Result<ModelFile, ParseError> {
    Parser::new(source).parse_file()
}
