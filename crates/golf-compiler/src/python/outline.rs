//! Module outline: the top-level shape of a component source file.

use std::collections::HashSet;
use std::fmt;

use rustpython_parser::ast::{self, Ranged};
use rustpython_parser::{parse, Mode};

use super::expr::{lower, source_text, Expr};

/// A parse failure with the 1-based line it was detected on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// 1-based source line.
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for SyntaxError {}

/// How a parameter may be passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Before a `/` marker.
    PositionalOnly,
    /// Ordinary parameter.
    PositionalOrKeyword,
    /// After `*` or `*args`.
    KeywordOnly,
    /// `*args`.
    VarPositional,
    /// `**kwargs`.
    VarKeyword,
}

impl ParamKind {
    /// Whether the parameter collects extra arguments.
    pub fn is_variadic(self) -> bool {
        matches!(self, Self::VarPositional | Self::VarKeyword)
    }
}

/// One function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Passing convention.
    pub kind: ParamKind,
    /// Annotation, if any.
    pub annotation: Option<Expr>,
    /// Default value, if any.
    pub default: Option<Expr>,
    /// Default value source text, if any.
    pub default_text: Option<String>,
}

/// A top-level `def` or `async def`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Function name.
    pub name: String,
    /// Declared with `async def`.
    pub is_async: bool,
    /// Parameters in declaration order.
    pub params: Vec<Param>,
    /// Return annotation, if any.
    pub returns: Option<Expr>,
    /// Decorator expressions, outermost first.
    pub decorators: Vec<Expr>,
    /// 1-based line of the `def`.
    pub line: usize,
}

/// An annotated class attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassField {
    /// Attribute name.
    pub name: String,
    /// Annotation.
    pub annotation: Expr,
    /// Default value, if any.
    pub default: Option<Expr>,
}

/// A top-level class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    /// Class name.
    pub name: String,
    /// Positional base expressions.
    pub bases: Vec<Expr>,
    /// Keyword arguments in the class header (e.g. `total=False`).
    pub keywords: Vec<(String, Expr)>,
    /// Decorator expressions, outermost first.
    pub decorators: Vec<Expr>,
    /// Annotated attributes at the class body level.
    pub fields: Vec<ClassField>,
    /// Unannotated `NAME = value` attributes at the class body level.
    pub constants: Vec<(String, Expr)>,
    /// 1-based line of the `class`.
    pub line: usize,
}

impl ClassDef {
    /// Whether any base's last name segment is one of `names`.
    pub fn has_base(&self, names: &[&str]) -> bool {
        self.bases
            .iter()
            .filter_map(base_of)
            .any(|b| names.contains(&b))
    }

    /// Whether any decorator's last name segment is `name`.
    pub fn has_decorator(&self, name: &str) -> bool {
        self.decorators.iter().any(|d| decorator_name(d) == Some(name))
    }
}

/// Last name segment of a base expression, unwrapping `Generic[T]`-style subscripts.
pub fn base_of(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Subscript { value, .. } => value.base_name(),
        other => other.base_name(),
    }
}

fn decorator_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Call { func, .. } => func.base_name(),
        other => other.base_name(),
    }
}

/// `import a.b as c` or `from a import b as c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Source module (`a.b`, `.common`).
    pub module: String,
    /// Imported name for `from` imports.
    pub name: Option<String>,
    /// Local binding.
    pub alias: String,
}

/// A top-level `NAME = value` or `NAME: T = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Bound name.
    pub target: String,
    /// Assigned value.
    pub value: Expr,
    /// 1-based line.
    pub line: usize,
}

/// The statically visible shape of a module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleOutline {
    /// Leading string literal, if any.
    pub docstring: Option<String>,
    /// Top-level imports.
    pub imports: Vec<Import>,
    /// Top-level single-target assignments.
    pub assignments: Vec<Assignment>,
    /// Top-level functions.
    pub functions: Vec<FunctionDef>,
    /// Top-level classes.
    pub classes: Vec<ClassDef>,
}

impl ModuleOutline {
    /// The last top-level function with this name.
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().rev().find(|f| f.name == name)
    }

    /// The last top-level class with this name.
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().rev().find(|c| c.name == name)
    }

    /// All assignments to `target`, in source order.
    pub fn assignments_to<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a Assignment> {
        self.assignments.iter().filter(move |a| a.target == target)
    }

    /// Original dotted name for a local alias introduced by an import.
    pub fn resolve_alias(&self, local: &str) -> Option<String> {
        let import = self.imports.iter().rev().find(|i| i.alias == local)?;
        Some(match &import.name {
            Some(name) => name.clone(),
            None => import.module.clone(),
        })
    }
}

/// Parse a module and collect its top level.
///
/// # Errors
///
/// Returns a [`SyntaxError`] if the source is not valid Python or a
/// function repeats a parameter name.
pub fn parse_module(source: &str) -> Result<ModuleOutline, SyntaxError> {
    let module = match parse(source, Mode::Module, "<component>") {
        Ok(ast::Mod::Module(module)) => module,
        Ok(_) => return Ok(ModuleOutline::default()),
        Err(err) => {
            return Err(SyntaxError {
                line: line_at(source, usize::from(err.offset)),
                message: err.error.to_string(),
            });
        }
    };

    let builder = OutlineBuilder { source };
    let mut outline = ModuleOutline {
        docstring: module.body.first().and_then(docstring),
        ..ModuleOutline::default()
    };

    for stmt in &module.body {
        match stmt {
            ast::Stmt::FunctionDef(def) => outline.functions.push(builder.function(
                def.name.as_str(),
                false,
                &def.args,
                def.returns.as_deref(),
                &def.decorator_list,
                stmt,
            )?),
            ast::Stmt::AsyncFunctionDef(def) => outline.functions.push(builder.function(
                def.name.as_str(),
                true,
                &def.args,
                def.returns.as_deref(),
                &def.decorator_list,
                stmt,
            )?),
            ast::Stmt::ClassDef(def) => outline.classes.push(builder.class(def)),
            ast::Stmt::Import(import) => {
                outline.imports.extend(import.names.iter().map(|alias| {
                    let module = alias.name.as_str().to_string();
                    let local = match &alias.asname {
                        Some(asname) => asname.as_str().to_string(),
                        None => module.split('.').next().unwrap_or(&module).to_string(),
                    };
                    Import {
                        module,
                        name: None,
                        alias: local,
                    }
                }));
            }
            ast::Stmt::ImportFrom(import) => {
                let level = import.level.as_ref().map_or(0, |l| l.to_u32() as usize);
                let module = format!(
                    "{}{}",
                    ".".repeat(level),
                    import.module.as_ref().map_or("", |m| m.as_str())
                );
                outline.imports.extend(import.names.iter().map(|alias| {
                    let name = alias.name.as_str().to_string();
                    Import {
                        module: module.clone(),
                        alias: alias
                            .asname
                            .as_ref()
                            .map_or_else(|| name.clone(), |a| a.as_str().to_string()),
                        name: Some(name),
                    }
                }));
            }
            ast::Stmt::Assign(assign) => {
                // Chained assignments (`a = b = 1`) do not bind an entry point.
                if let [ast::Expr::Name(target)] = assign.targets.as_slice() {
                    outline.assignments.push(builder.assignment(target, &assign.value, stmt));
                }
            }
            ast::Stmt::AnnAssign(assign) => {
                if let (ast::Expr::Name(target), Some(value)) = (assign.target.as_ref(), &assign.value) {
                    outline.assignments.push(builder.assignment(target, value, stmt));
                }
            }
            _ => {}
        }
    }

    Ok(outline)
}

fn docstring(stmt: &ast::Stmt) -> Option<String> {
    let ast::Stmt::Expr(expr) = stmt else {
        return None;
    };
    match expr.value.as_ref() {
        ast::Expr::Constant(ast::ExprConstant {
            value: ast::Constant::Str(text),
            ..
        }) => Some(text.clone()),
        _ => None,
    }
}

fn line_at(source: &str, offset: usize) -> usize {
    let prefix = source.get(..offset).unwrap_or(source);
    prefix.matches('\n').count() + 1
}

struct OutlineBuilder<'s> {
    source: &'s str,
}

impl OutlineBuilder<'_> {
    fn lower(&self, expr: &ast::Expr) -> Expr {
        lower(expr, self.source)
    }

    fn line(&self, node: &impl Ranged) -> usize {
        line_at(self.source, usize::from(node.range().start()))
    }

    fn function(
        &self,
        name: &str,
        is_async: bool,
        args: &ast::Arguments,
        returns: Option<&ast::Expr>,
        decorators: &[ast::Expr],
        stmt: &ast::Stmt,
    ) -> Result<FunctionDef, SyntaxError> {
        let mut params: Vec<Param> = Vec::new();
        let groups = [
            (ParamKind::PositionalOnly, &args.posonlyargs),
            (ParamKind::PositionalOrKeyword, &args.args),
        ];
        for (kind, group) in groups {
            params.extend(group.iter().map(|arg| self.param(arg, kind)));
        }
        if let Some(vararg) = &args.vararg {
            params.push(self.bare_param(vararg, ParamKind::VarPositional));
        }
        params.extend(
            args.kwonlyargs
                .iter()
                .map(|arg| self.param(arg, ParamKind::KeywordOnly)),
        );
        if let Some(kwarg) = &args.kwarg {
            params.push(self.bare_param(kwarg, ParamKind::VarKeyword));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = params.iter().find(|p| !seen.insert(p.name.as_str())) {
            return Err(SyntaxError {
                line: self.line(stmt),
                message: format!(
                    "duplicate argument `{}` in function definition",
                    duplicate.name
                ),
            });
        }

        Ok(FunctionDef {
            name: name.to_string(),
            is_async,
            params,
            returns: returns.map(|r| self.lower(r)),
            decorators: decorators.iter().map(|d| self.lower(d)).collect(),
            line: self.line(stmt),
        })
    }

    fn param(&self, arg: &ast::ArgWithDefault, kind: ParamKind) -> Param {
        let mut param = self.bare_param(&arg.def, kind);
        if let Some(default) = &arg.default {
            param.default = Some(self.lower(default));
            param.default_text = Some(source_text(&**default, self.source));
        }
        param
    }

    fn bare_param(&self, arg: &ast::Arg, kind: ParamKind) -> Param {
        Param {
            name: arg.arg.as_str().to_string(),
            kind,
            annotation: arg.annotation.as_deref().map(|a| self.lower(a)),
            default: None,
            default_text: None,
        }
    }

    fn class(&self, def: &ast::StmtClassDef) -> ClassDef {
        let mut class = ClassDef {
            name: def.name.as_str().to_string(),
            bases: def.bases.iter().map(|b| self.lower(b)).collect(),
            keywords: def
                .keywords
                .iter()
                .filter_map(|k| Some((k.arg.as_ref()?.as_str().to_string(), self.lower(&k.value))))
                .collect(),
            decorators: def.decorator_list.iter().map(|d| self.lower(d)).collect(),
            fields: Vec::new(),
            constants: Vec::new(),
            line: self.line(def),
        };

        for stmt in &def.body {
            match stmt {
                ast::Stmt::AnnAssign(assign) => {
                    let ast::Expr::Name(target) = assign.target.as_ref() else {
                        continue;
                    };
                    let annotation = self.lower(&assign.annotation);
                    if base_of(&annotation) == Some("ClassVar") {
                        continue;
                    }
                    class.fields.push(ClassField {
                        name: target.id.as_str().to_string(),
                        annotation,
                        default: assign.value.as_deref().map(|v| self.lower(v)),
                    });
                }
                ast::Stmt::Assign(assign) => {
                    if let [ast::Expr::Name(target)] = assign.targets.as_slice() {
                        class
                            .constants
                            .push((target.id.as_str().to_string(), self.lower(&assign.value)));
                    }
                }
                _ => {}
            }
        }
        class
    }

    fn assignment(&self, target: &ast::ExprName, value: &ast::Expr, stmt: &ast::Stmt) -> Assignment {
        Assignment {
            target: target.id.as_str().to_string(),
            value: self.lower(value),
            line: self.line(stmt),
        }
    }
}
