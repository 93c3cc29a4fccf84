//! Symbolic expression to AST.
//!
//! Deserialization runs in two passes. [`Deserializer::validate`] walks the
//! whole value, checking every tag against the tag table for the active
//! version; only if that succeeds does construction build AST nodes. The
//! version is passed down both passes rather than stored.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::error::ProtocolError;
use super::tags::{self, ArgShape, EXP, META, ROOT, TERM, VERSION};
use super::AstVersion;
use crate::ast::{
    Assignment, CaseSensitivity, DataManipulation, DataType, DmlOp, Expr, ExprKind, FromSource,
    FromSourceKind, GroupBy, GroupByItem, GroupingStrategy, JoinOp, Meta, MetaContainer, NAryOp,
    PathStep, PathStepKind, Projection, ScopeQualifier, Select, SelectListItem, SeqKind,
    SetQuantifier, SourceLocation, SqlDataType, StructField, SymbolicName, TypedOp, WhenClause,
    IS_COUNT_STAR_TAG, IS_IMPLICIT_JOIN_TAG, IS_SYNTHETIC_NAME_TAG, LEGACY_LOGICAL_NOT_TAG,
    SOURCE_LOCATION_TAG, STATIC_TYPE_TAG,
};
use crate::value::{Reader, Value, DEFAULT_MAX_DEPTH};

type Result<T> = std::result::Result<T, ProtocolError>;

/// Decodes the payload of one V1 metadata entry.
pub type MetaDecoder = fn(&Value) -> Result<Meta>;

/// Deserialization limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeserializeOptions {
    /// Deepest symbolic expression nesting accepted.
    pub max_depth: usize,
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Reads serialized ASTs in either protocol version.
#[derive(Debug, Clone)]
pub struct Deserializer {
    options: DeserializeOptions,
    decoders: HashMap<String, MetaDecoder>,
}

impl Default for Deserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer {
    /// Creates a deserializer with default options and the built-in
    /// metadata decoders.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(DeserializeOptions::default())
    }

    #[must_use]
    pub fn with_options(options: DeserializeOptions) -> Self {
        let mut decoders: HashMap<String, MetaDecoder> = HashMap::new();
        decoders.insert(SOURCE_LOCATION_TAG.to_string(), decode_source_location);
        decoders.insert(IS_COUNT_STAR_TAG.to_string(), |_| Ok(Meta::IsCountStar));
        decoders.insert(LEGACY_LOGICAL_NOT_TAG.to_string(), |_| {
            Ok(Meta::LegacyLogicalNot)
        });
        decoders.insert(IS_IMPLICIT_JOIN_TAG.to_string(), |_| Ok(Meta::IsImplicitJoin));
        decoders.insert(IS_SYNTHETIC_NAME_TAG.to_string(), |_| {
            Ok(Meta::IsSyntheticName)
        });
        decoders.insert(STATIC_TYPE_TAG.to_string(), decode_static_type);
        Self { options, decoders }
    }

    /// Registers a decoder for a metadata tag, replacing any existing one.
    #[must_use]
    pub fn with_decoder(mut self, tag: impl Into<String>, decoder: MetaDecoder) -> Self {
        self.decoders.insert(tag.into(), decoder);
        self
    }

    /// Deserializes a serialized AST, with or without the V1 envelope.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if validation or construction fails.
    /// Nothing is constructed unless the whole value validates.
    pub fn deserialize(&self, value: &Value) -> Result<Expr> {
        let (version, root) = unwrap_envelope(value)?;
        self.validate(root, version)?;
        let expr = self.expr(root, version)?;
        debug!(%version, "deserialized AST");
        Ok(expr)
    }

    /// Reads the text form, then deserializes it.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidText`] if the text cannot be read,
    /// otherwise as [`Deserializer::deserialize`].
    pub fn deserialize_str(&self, text: &str) -> Result<Expr> {
        let value = Reader::new(text)
            .with_max_depth(self.options.max_depth)
            .read_single()?;
        self.deserialize(&value)
    }

    /// Checks every tag and argument count in `value` without building
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProtocolError`] found in pre-order.
    pub fn validate(&self, value: &Value, version: AstVersion) -> Result<()> {
        self.validate_node(value, version, 0)
    }

    fn validate_node(&self, value: &Value, version: AstVersion, depth: usize) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(ProtocolError::NestingTooDeep {
                max_depth: self.options.max_depth,
            });
        }
        let (tag, args) = split(value)?;
        let spec = tags::lookup(tag).ok_or_else(|| ProtocolError::UnknownTag {
            tag: tag.to_string(),
        })?;
        let arity = spec
            .arity(version)
            .ok_or_else(|| ProtocolError::TagNotInVersion {
                tag: tag.to_string(),
                version,
            })?;
        if !arity.accepts(args.len()) {
            return Err(ProtocolError::ArityOutOfRange {
                tag: tag.to_string(),
                expected: arity,
                found: args.len(),
            });
        }

        let nodes = match spec.shape {
            ArgShape::Nodes => args,
            ArgShape::Raw => &[],
            ArgShape::Leading(n) => args.get(n..).unwrap_or_default(),
            ArgShape::Meta => return self.validate_meta(args, version, depth),
            ArgShape::Term => return self.validate_term(args, version, depth),
            ArgShape::Envelope => {
                return Err(ProtocolError::malformed(format!(
                    "envelope tag '{tag}' inside the tree"
                )))
            }
        };
        nodes
            .iter()
            .try_for_each(|node| self.validate_node(node, version, depth + 1))
    }

    /// V0 `(meta <node> {line, column})` is a wrapper. In V1 a meta list
    /// only appears as the second argument of `term`.
    fn validate_meta(&self, args: &[Value], version: AstVersion, depth: usize) -> Result<()> {
        match (version, args) {
            (AstVersion::V0, [node, Value::Struct(_)]) => {
                self.validate_node(node, version, depth + 1)
            }
            (AstVersion::V0, _) => Err(ProtocolError::malformed(
                "meta wrapper needs a node and a location struct",
            )),
            (AstVersion::V1, _) => Err(ProtocolError::malformed("meta list outside a term")),
        }
    }

    /// Checks `(term (exp <node>) [(meta (<tag> <payload>) ...)])`.
    ///
    /// Each metadata entry must be a symbol tag with exactly one payload;
    /// payload content is left to the entry's decoder.
    fn validate_term(&self, args: &[Value], version: AstVersion, depth: usize) -> Result<()> {
        let mut args = args.iter();
        let node = match args.next().map(split).transpose()? {
            Some((EXP, [node])) => node,
            _ => return Err(ProtocolError::malformed("term must start with (exp <node>)")),
        };
        if let Some(metas) = args.next() {
            match split(metas)? {
                (META, entries) => {
                    for entry in entries {
                        match entry.as_sexp() {
                            Some([Value::Symbol(_), _]) => {}
                            _ => {
                                return Err(ProtocolError::malformed(format!(
                                    "meta entry must be (<tag> <payload>), found {entry}"
                                )))
                            }
                        }
                    }
                }
                (tag, _) => {
                    return Err(ProtocolError::malformed(format!(
                        "term expects a meta list, found '{tag}'"
                    )))
                }
            }
        }
        self.validate_node(node, version, depth + 1)
    }

    /// Strips one meta/term wrapper, returning the wrapped node and the
    /// wrapper's metadata. Returns `None` if `value` is not a wrapper.
    fn strip<'v>(
        &self,
        value: &'v Value,
        version: AstVersion,
    ) -> Result<Option<(&'v Value, MetaContainer)>> {
        let (tag, args) = split(value)?;
        match (version, tag, args) {
            (AstVersion::V0, META, [inner, location]) => {
                let location = Meta::SourceLocation(decode_v0_location(location)?);
                Ok(Some((inner, MetaContainer::new().with(location))))
            }
            (AstVersion::V1, TERM, [exp, rest @ ..]) => {
                let mut metas = MetaContainer::new();
                if let Some(list) = rest.first() {
                    for entry in split(list)?.1 {
                        metas.add(self.decode_meta(entry)?);
                    }
                }
                Ok(Some((single(split(exp)?.1, EXP)?, metas)))
            }
            _ => Ok(None),
        }
    }

    /// Strips every wrapper from a node, merging their metadata.
    fn unwrap<'v>(
        &self,
        value: &'v Value,
        version: AstVersion,
    ) -> Result<(&'v str, &'v [Value], MetaContainer)> {
        let mut metas = MetaContainer::new();
        let mut current = value;
        while let Some((inner, layer)) = self.strip(current, version)? {
            metas = metas.merged(&layer);
            current = inner;
        }
        let (tag, args) = split(current)?;
        Ok((tag, args, metas))
    }

    fn decode_meta(&self, entry: &Value) -> Result<Meta> {
        let (tag, payload) = match entry.as_sexp() {
            Some([Value::Symbol(tag), payload]) => (tag.as_str(), payload),
            _ => return Err(ProtocolError::malformed(format!("meta entry {entry}"))),
        };
        match self.decoders.get(tag) {
            Some(decoder) => decoder(payload),
            None => {
                warn!(tag, "no decoder for metadata tag, keeping it opaque");
                Ok(Meta::Opaque {
                    tag: tag.to_string(),
                    value: payload.clone(),
                })
            }
        }
    }

    fn expr(&self, value: &Value, version: AstVersion) -> Result<Expr> {
        let (tag, args, metas) = self.unwrap(value, version)?;

        let kind = match tag {
            "lit" => ExprKind::Literal(single(args, tag)?.clone()),
            "missing" => ExprKind::Missing,
            "id" => {
                let name = raw_text(arg(args, 0, tag)?, "identifier name")?;
                let case = case_sensitivity(arg(args, 1, tag)?)?;
                let scope = match args.get(2) {
                    Some(scope) => ScopeQualifier::from_symbol(raw_text(scope, "scope")?)
                        .ok_or_else(|| ProtocolError::malformed(format!("scope {scope}")))?,
                    None => ScopeQualifier::Unqualified,
                };
                ExprKind::Id {
                    name: name.to_string(),
                    case,
                    scope,
                }
            }
            "@" => match self.expr(single(args, tag)?, version)?.kind {
                ExprKind::Id { name, case, .. } => ExprKind::Id {
                    name,
                    case,
                    scope: ScopeQualifier::LocalsFirst,
                },
                _ => return Err(ProtocolError::malformed("'@' must wrap an identifier")),
            },
            "parameter" => {
                let index = single(args, tag)?
                    .as_i64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| ProtocolError::malformed("parameter index"))?;
                ExprKind::Parameter(index)
            }
            "call" => {
                let name = raw_text(arg(args, 0, tag)?, "function name")?;
                let mut call_args = vec![Expr::id(name)];
                call_args.extend(self.exprs(&args[1..], version)?);
                ExprKind::NAry {
                    op: NAryOp::Call,
                    args: call_args,
                }
            }
            "call_agg" => {
                let name = raw_text(arg(args, 0, tag)?, "function name")?;
                let quantifier = raw_text(arg(args, 1, tag)?, "set quantifier")?;
                ExprKind::CallAgg {
                    func: SymbolicName::new(name.to_string()),
                    quantifier: SetQuantifier::from_symbol(quantifier).ok_or_else(|| {
                        ProtocolError::malformed(format!("set quantifier '{quantifier}'"))
                    })?,
                    arg: Box::new(self.expr(arg(args, 2, tag)?, version)?),
                }
            }
            "call_agg_wildcard" => {
                let name = raw_text(single(args, tag)?, "function name")?;
                let expr = Expr::new(ExprKind::CallAgg {
                    func: SymbolicName::new(name.to_string()),
                    quantifier: SetQuantifier::All,
                    arg: Box::new(Expr::lit(1_i64)),
                });
                return Ok(expr.with_metas(metas.with(Meta::IsCountStar)));
            }
            "cast" | "is" => ExprKind::Typed {
                op: if tag == "cast" {
                    TypedOp::Cast
                } else {
                    TypedOp::Is
                },
                expr: Box::new(self.expr(arg(args, 0, tag)?, version)?),
                ty: data_type(arg(args, 1, tag)?)?,
            },
            "is_not" => {
                let inner = ExprKind::Typed {
                    op: TypedOp::Is,
                    expr: Box::new(self.expr(arg(args, 0, tag)?, version)?),
                    ty: data_type(arg(args, 1, tag)?)?,
                };
                return Ok(legacy_not(inner, metas));
            }
            "path" => {
                let (root, steps) = args
                    .split_first()
                    .ok_or_else(|| ProtocolError::malformed("path without a root"))?;
                ExprKind::Path {
                    root: Box::new(self.expr(root, version)?),
                    steps: steps
                        .iter()
                        .map(|s| self.path_step(s, version))
                        .collect::<Result<_>>()?,
                }
            }
            "simple_case" => {
                let (value, arms) = args
                    .split_first()
                    .ok_or_else(|| ProtocolError::malformed("simple_case without a value"))?;
                let (whens, default) = self.case_arms(arms, version)?;
                ExprKind::SimpleCase {
                    value: Box::new(self.expr(value, version)?),
                    whens,
                    default,
                }
            }
            "searched_case" => {
                let (whens, default) = self.case_arms(args, version)?;
                ExprKind::SearchedCase { whens, default }
            }
            "struct" => ExprKind::Struct(
                args.iter()
                    .map(|member| {
                        let [name, value] = self.tagged(member, "member", version)?;
                        Ok(StructField {
                            name: self.expr(name, version)?,
                            value: self.expr(value, version)?,
                        })
                    })
                    .collect::<Result<_>>()?,
            ),
            "select" | "pivot" => ExprKind::Select(Box::new(self.select(tag, args, version)?)),
            "dml" => ExprKind::Dml(Box::new(self.dml(args, version)?)),
            "create_table" => ExprKind::CreateTable {
                name: raw_name(single(args, tag)?)?,
            },
            "drop_table" => ExprKind::DropTable {
                name: raw_name(single(args, tag)?)?,
            },
            "create_index" => {
                let (keys_tag, keys, _) = self.unwrap(arg(args, 1, tag)?, version)?;
                if keys_tag != "keys" {
                    return Err(ProtocolError::malformed(format!(
                        "create_index expects (keys ...), found '{keys_tag}'"
                    )));
                }
                ExprKind::CreateIndex {
                    table: raw_name(arg(args, 0, tag)?)?,
                    keys: self.exprs(keys, version)?,
                }
            }
            "drop_index" => ExprKind::DropIndex {
                table: raw_name(arg(args, 0, tag)?)?,
                index: Box::new(self.expr(arg(args, 1, tag)?, version)?),
            },
            _ => {
                if let Some(kind) = SeqKind::from_symbol(tag) {
                    ExprKind::Seq {
                        kind,
                        items: self.exprs(args, version)?,
                    }
                } else if let Some(op) = negated_op(tag) {
                    let inner = ExprKind::NAry {
                        op,
                        args: self.exprs(args, version)?,
                    };
                    return Ok(legacy_not(inner, metas));
                } else if let Some(op) = NAryOp::from_symbol(tag) {
                    ExprKind::NAry {
                        op,
                        args: self.exprs(args, version)?,
                    }
                } else {
                    return Err(ProtocolError::malformed(format!(
                        "'{tag}' is not an expression"
                    )));
                }
            }
        };
        Ok(Expr::new(kind).with_metas(metas))
    }

    fn exprs(&self, values: &[Value], version: AstVersion) -> Result<Vec<Expr>> {
        values.iter().map(|v| self.expr(v, version)).collect()
    }

    /// Unwraps a node that must carry `tag` and exactly `N` arguments.
    fn tagged<'v, const N: usize>(
        &self,
        value: &'v Value,
        tag: &str,
        version: AstVersion,
    ) -> Result<[&'v Value; N]> {
        let (found, args, _) = self.unwrap(value, version)?;
        if found != tag {
            return Err(ProtocolError::malformed(format!(
                "expected ({tag} ...), found ({found} ...)"
            )));
        }
        let refs: Vec<&Value> = args.iter().collect();
        refs.try_into().map_err(|_: Vec<&Value>| {
            ProtocolError::malformed(format!("({tag} ...) expects {N} arguments"))
        })
    }

    fn path_step(&self, value: &Value, version: AstVersion) -> Result<PathStep> {
        let (tag, args, metas) = self.unwrap(value, version)?;
        let kind = match tag {
            "path_wildcard" => PathStepKind::Wildcard,
            "path_unpivot" => PathStepKind::Unpivot,
            _ => {
                let case = CaseSensitivity::from_symbol(tag)
                    .ok_or_else(|| ProtocolError::malformed(format!("path step '{tag}'")))?;
                PathStepKind::Expr {
                    index: Box::new(self.expr(single(args, tag)?, version)?),
                    case,
                }
            }
        };
        Ok(PathStep::new(kind).with_metas(metas))
    }

    fn case_arms(
        &self,
        arms: &[Value],
        version: AstVersion,
    ) -> Result<(Vec<WhenClause>, Option<Box<Expr>>)> {
        let mut whens = Vec::new();
        let mut default = None;
        for (i, arm) in arms.iter().enumerate() {
            let (tag, args, _) = self.unwrap(arm, version)?;
            match tag {
                "when" if default.is_none() => {
                    whens.push(WhenClause {
                        condition: self.expr(arg(args, 0, tag)?, version)?,
                        result: self.expr(arg(args, 1, tag)?, version)?,
                    });
                }
                "else" if i + 1 == arms.len() => {
                    default = Some(Box::new(self.expr(single(args, tag)?, version)?));
                }
                _ => return Err(ProtocolError::malformed(format!("'{tag}' in a CASE"))),
            }
        }
        if whens.is_empty() {
            return Err(ProtocolError::malformed("CASE without a when"));
        }
        Ok((whens, default))
    }

    fn select(&self, tag: &str, args: &[Value], version: AstVersion) -> Result<Select> {
        let mut clauses = args.iter().map(split);
        let (quantifier, projection) = match clauses.next().transpose()? {
            Some(("member", [key, value])) if tag == "pivot" => (
                SetQuantifier::All,
                Projection::Pivot {
                    value: self.expr(value, version)?,
                    key: self.expr(key, version)?,
                },
            ),
            Some((project @ ("project" | "project_distinct"), [inner])) if tag == "select" => {
                let quantifier = if project == "project" {
                    SetQuantifier::All
                } else {
                    SetQuantifier::Distinct
                };
                (quantifier, self.projection(inner, version)?)
            }
            _ => {
                return Err(ProtocolError::malformed(format!(
                    "{tag} must start with its projection"
                )))
            }
        };

        let from = match clauses.next().transpose()? {
            Some(("from", [source])) => self.from_source(source, version)?,
            _ => return Err(ProtocolError::malformed(format!("{tag} without from"))),
        };
        let mut select = Select::new(projection, from);
        select.quantifier = quantifier;

        let mut last_rank = 0;
        for clause in clauses {
            let (clause_tag, clause_args) = clause?;
            let rank = match clause_tag {
                "where" => 1,
                "group" | "group_partial" => 2,
                "having" => 3,
                "limit" => 4,
                _ => 0,
            };
            if rank <= last_rank {
                return Err(ProtocolError::malformed(format!(
                    "unexpected '{clause_tag}' clause in {tag}"
                )));
            }
            last_rank = rank;
            match rank {
                1 => select.where_clause = Some(self.expr(single(clause_args, clause_tag)?, version)?),
                2 => select.group_by = Some(self.group_by(clause_tag, clause_args, version)?),
                3 => select.having = Some(self.expr(single(clause_args, clause_tag)?, version)?),
                _ => select.limit = Some(self.expr(single(clause_args, clause_tag)?, version)?),
            }
        }
        Ok(select)
    }

    fn projection(&self, value: &Value, version: AstVersion) -> Result<Projection> {
        match split(value)? {
            ("value", [expr]) => Ok(Projection::Value(self.expr(expr, version)?)),
            ("list", items) => Ok(Projection::List(
                items
                    .iter()
                    .map(|item| self.select_item(item, version))
                    .collect::<Result<_>>()?,
            )),
            (tag, _) => Err(ProtocolError::malformed(format!("projection '{tag}'"))),
        }
    }

    fn select_item(&self, value: &Value, version: AstVersion) -> Result<SelectListItem> {
        Ok(match split(value)? {
            ("star", []) => SelectListItem::Star,
            ("project_all", [expr]) => SelectListItem::ProjectAll(self.expr(expr, version)?),
            ("as", [alias, expr]) => SelectListItem::Expr {
                expr: self.expr(expr, version)?,
                alias: Some(raw_name(alias)?),
            },
            _ => SelectListItem::Expr {
                expr: self.expr(value, version)?,
                alias: None,
            },
        })
    }

    fn group_by(&self, tag: &str, args: &[Value], version: AstVersion) -> Result<GroupBy> {
        let strategy = if tag == "group_partial" {
            GroupingStrategy::Partial
        } else {
            GroupingStrategy::Full
        };
        let items = match args.first().map(split).transpose()? {
            Some(("items", items)) => items
                .iter()
                .map(|item| {
                    Ok(match split(item)? {
                        ("as", [alias, expr]) => GroupByItem {
                            expr: self.expr(expr, version)?,
                            alias: Some(raw_name(alias)?),
                        },
                        _ => GroupByItem {
                            expr: self.expr(item, version)?,
                            alias: None,
                        },
                    })
                })
                .collect::<Result<_>>()?,
            _ => return Err(ProtocolError::malformed("group without items")),
        };
        let group_name = match args.get(1).map(split).transpose()? {
            Some(("name", [name])) => Some(raw_name(name)?),
            Some((other, _)) => {
                return Err(ProtocolError::malformed(format!("'{other}' in a group")))
            }
            None => None,
        };
        Ok(GroupBy {
            strategy,
            items,
            group_name,
        })
    }

    /// Reads a source. Alias wrappers may nest in any order but each may
    /// appear once. Only the outermost wrapper's metadata belongs to the
    /// source; the innermost node keeps its own. An unaliased expression
    /// without a wrapper of its own shares the source's metadata.
    fn from_source(&self, value: &Value, version: AstVersion) -> Result<FromSource> {
        let (mut current, mut metas) = self
            .strip(value, version)?
            .unwrap_or_else(|| (value, MetaContainer::new()));
        let (mut tag, mut args) = split(current)?;

        if let Some(op) = JoinOp::from_symbol(tag) {
            let (left, right) = match args {
                [left, right, ..] => (left, right),
                _ => return Err(ProtocolError::malformed("join needs two sources")),
            };
            let condition = match args.get(2) {
                Some(cond) => self.expr(cond, version)?,
                None => {
                    metas.add(Meta::IsImplicitJoin);
                    Expr::lit(true)
                }
            };
            return Ok(FromSource::new(FromSourceKind::Join {
                op,
                left: Box::new(self.from_source(left, version)?),
                right: Box::new(self.from_source(right, version)?),
                condition,
            })
            .with_metas(metas));
        }

        let mut alias = None;
        let mut at = None;
        let mut by = None;
        loop {
            let slot = match tag {
                "as" => &mut alias,
                "at" => &mut at,
                "by" => &mut by,
                _ => break,
            };
            if slot.is_some() {
                return Err(ProtocolError::malformed(format!("repeated '{tag}' on a source")));
            }
            *slot = Some(raw_name(arg(args, 0, tag)?)?);
            current = arg(args, 1, tag)?;
            (tag, args) = split(current)?;
        }

        let kind = if tag == "unpivot" {
            FromSourceKind::Unpivot {
                expr: self.expr(single(args, tag)?, version)?,
                alias,
                at,
                by,
            }
        } else {
            let mut expr = self.expr(current, version)?;
            if alias.is_none() && at.is_none() && by.is_none() && expr.metas.is_empty() {
                expr.metas = metas.clone();
            }
            FromSourceKind::Expr {
                expr,
                alias,
                at,
                by,
            }
        };
        Ok(FromSource::new(kind).with_metas(metas))
    }

    fn dml(&self, args: &[Value], version: AstVersion) -> Result<DataManipulation> {
        let (op_value, clauses) = args
            .split_first()
            .ok_or_else(|| ProtocolError::malformed("dml without an operation"))?;
        let op = match split(op_value)? {
            ("insert", [target, values]) => DmlOp::Insert {
                target: self.expr(target, version)?,
                values: self.expr(values, version)?,
            },
            ("insert_value", [target, value, position @ ..]) if position.len() <= 1 => {
                DmlOp::InsertValue {
                    target: self.expr(target, version)?,
                    value: self.expr(value, version)?,
                    position: position
                        .first()
                        .map(|p| self.expr(p, version))
                        .transpose()?,
                }
            }
            ("set", assignments) => DmlOp::Set(
                assignments
                    .iter()
                    .map(|a| {
                        let [target, value] = self.tagged(a, "assignment", version)?;
                        Ok(Assignment {
                            target: self.expr(target, version)?,
                            value: self.expr(value, version)?,
                        })
                    })
                    .collect::<Result<_>>()?,
            ),
            ("remove", [target]) => DmlOp::Remove(self.expr(target, version)?),
            ("delete", []) => DmlOp::Delete,
            (tag, _) => return Err(ProtocolError::malformed(format!("dml operation '{tag}'"))),
        };

        let mut dml = DataManipulation {
            op,
            from: None,
            where_clause: None,
        };
        for clause in clauses {
            match split(clause)? {
                ("from", [source]) if dml.from.is_none() && dml.where_clause.is_none() => {
                    dml.from = Some(self.from_source(source, version)?);
                }
                ("where", [cond]) if dml.where_clause.is_none() => {
                    dml.where_clause = Some(self.expr(cond, version)?);
                }
                (tag, _) => {
                    return Err(ProtocolError::malformed(format!("'{tag}' clause in dml")))
                }
            }
        }
        Ok(dml)
    }
}

/// Detects the `(ast (version N) (root <node>))` envelope. Without one the
/// value is a V0 tree.
fn unwrap_envelope(value: &Value) -> Result<(AstVersion, &Value)> {
    if value.tag() != Some(tags::AST) {
        return Ok((AstVersion::V0, value));
    }
    let (_, args) = split(value)?;
    let (version, root) = match args {
        [version, root] => (split(version)?, split(root)?),
        _ => {
            return Err(ProtocolError::ArityOutOfRange {
                tag: tags::AST.to_string(),
                expected: tags::Arity::exact(2),
                found: args.len(),
            })
        }
    };
    let number = match version {
        (VERSION, [number]) => number,
        _ => return Err(ProtocolError::malformed("envelope must start with (version N)")),
    };
    let version = number
        .as_i64()
        .and_then(AstVersion::from_number)
        .ok_or_else(|| ProtocolError::UnsupportedVersion(number.to_string()))?;
    match root {
        (ROOT, [root]) => Ok((version, root)),
        _ => Err(ProtocolError::malformed("envelope must end with (root <node>)")),
    }
}

/// Splits a node into its tag and arguments.
fn split(value: &Value) -> Result<(&str, &[Value])> {
    let items = value.as_sexp().ok_or_else(|| {
        ProtocolError::malformed(format!("expected a node, found {}", value.type_name()))
    })?;
    match items.split_first() {
        Some((Value::Symbol(tag), args)) => Ok((tag.as_str(), args)),
        _ => Err(ProtocolError::malformed(format!("node without a tag: {value}"))),
    }
}

fn arg<'v>(args: &'v [Value], index: usize, tag: &str) -> Result<&'v Value> {
    args.get(index)
        .ok_or_else(|| ProtocolError::malformed(format!("'{tag}' is missing argument {index}")))
}

fn single<'v>(args: &'v [Value], tag: &str) -> Result<&'v Value> {
    match args {
        [only] => Ok(only),
        _ => Err(ProtocolError::malformed(format!(
            "'{tag}' expects one argument, found {}",
            args.len()
        ))),
    }
}

fn raw_text<'v>(value: &'v Value, what: &str) -> Result<&'v str> {
    value
        .as_text()
        .ok_or_else(|| ProtocolError::malformed(format!("{what} must be a symbol, found {value}")))
}

fn raw_name(value: &Value) -> Result<SymbolicName> {
    Ok(SymbolicName::new(raw_text(value, "name")?.to_string()))
}

fn case_sensitivity(value: &Value) -> Result<CaseSensitivity> {
    let text = raw_text(value, "case sensitivity")?;
    CaseSensitivity::from_symbol(text)
        .ok_or_else(|| ProtocolError::malformed(format!("case sensitivity '{text}'")))
}

fn data_type(value: &Value) -> Result<DataType> {
    let (tag, args) = split(value)?;
    if tag != "type" {
        return Err(ProtocolError::malformed(format!("expected (type ...), found '{tag}'")));
    }
    let (name, params) = args
        .split_first()
        .ok_or_else(|| ProtocolError::malformed("type without a name"))?;
    let name = raw_text(name, "type name")?;
    let sql_type = SqlDataType::from_name(name)
        .ok_or_else(|| ProtocolError::malformed(format!("unknown type '{name}'")))?;
    let params = params
        .iter()
        .map(|p| {
            p.as_i64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| ProtocolError::malformed(format!("type parameter {p}")))
        })
        .collect::<Result<Vec<_>>>()?;
    let ty = DataType::with_args(sql_type, params);
    if !ty.is_valid() {
        return Err(ProtocolError::malformed(format!(
            "type '{}' does not take {} parameters",
            sql_type.name(),
            ty.args.len()
        )));
    }
    Ok(ty)
}

fn negated_op(tag: &str) -> Option<NAryOp> {
    [NAryOp::In, NAryOp::Like, NAryOp::Between]
        .into_iter()
        .find(|op| op.negated_symbol() == Some(tag))
}

/// Rebuilds `NOT inner` from a negated operator tag. Both nodes keep the
/// wrapper's metadata; only the `NOT` is marked.
fn legacy_not(inner: ExprKind, metas: MetaContainer) -> Expr {
    let mut inner_metas = metas.clone();
    inner_metas.remove(LEGACY_LOGICAL_NOT_TAG);
    let inner = Expr::new(inner).with_metas(inner_metas);
    Expr::nary(NAryOp::Not, vec![inner]).with_metas(metas.with(Meta::LegacyLogicalNot))
}

fn decode_v0_location(value: &Value) -> Result<SourceLocation> {
    let field = |name: &str| {
        value
            .field(name)
            .and_then(Value::as_i64)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| ProtocolError::malformed(format!("meta location without '{name}'")))
    };
    Ok(SourceLocation {
        line: field("line")?,
        column: field("column")?,
        length: 0,
    })
}

fn decode_source_location(payload: &Value) -> Result<Meta> {
    let field = |name: &str| {
        payload
            .field(name)
            .and_then(Value::as_i64)
            .and_then(|n| usize::try_from(n).ok())
    };
    match (field("line_num"), field("char_offset")) {
        (Some(line), Some(column)) => Ok(Meta::SourceLocation(SourceLocation {
            line,
            column,
            length: field("length").unwrap_or(0),
        })),
        _ => Err(ProtocolError::malformed(format!(
            "{SOURCE_LOCATION_TAG} payload {payload}"
        ))),
    }
}

fn decode_static_type(payload: &Value) -> Result<Meta> {
    payload
        .as_text()
        .and_then(SqlDataType::from_name)
        .map(Meta::StaticType)
        .ok_or_else(|| ProtocolError::malformed(format!("{STATIC_TYPE_TAG} payload {payload}")))
}
