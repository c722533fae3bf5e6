//! Tree-walking evaluator for parsed component scripts
//!
//! Evaluation is eager: a JSX expression renders its subtree on the spot,
//! calling components as it meets them. Hooks are answered by the host
//! scope; every effect handle the scope hands out is recorded in the
//! caller's list so the owning sandbox can tear it down.

use std::collections::HashMap;
use std::sync::Arc;

use super::ast::*;
use super::parser::format_number;
use super::value::{Closure, Value};
use crate::preview::sandbox::RenderError;
use crate::preview::scope::{EffectHandle, EffectRequest, HostScope, StateSlot};
use crate::preview::tree::{Prop, VisualNode};

/// Nested function calls allowed before a RangeError
pub const MAX_CALL_DEPTH: usize = 64;

type EvalResult<T> = Result<T, RenderError>;

/// Evaluate a program and return what its `render(...)` call produced
///
/// Effects scheduled during evaluation are appended to `effects` even when
/// evaluation fails, so the caller can cancel them.
pub fn evaluate(
    program: &Program,
    scope: &dyn HostScope,
    sandbox: u64,
    effects: &mut Vec<EffectHandle>,
) -> EvalResult<Vec<VisualNode>> {
    let mut evaluator = Evaluator {
        scope,
        sandbox,
        globals: HashMap::new(),
        frames: Vec::new(),
        hooks: Vec::new(),
        next_instance: 0,
        depth: 0,
        effects,
    };
    evaluator.run(program)
}

struct HookFrame {
    instance: u32,
    next_hook: u32,
    component: String,
}

enum Flow {
    Normal,
    Return(Value),
}

struct Evaluator<'a> {
    scope: &'a dyn HostScope,
    sandbox: u64,
    globals: HashMap<String, Value>,
    /// Local frames of active calls; empty at top level
    frames: Vec<HashMap<String, Value>>,
    /// One frame per component currently rendering
    hooks: Vec<HookFrame>,
    next_instance: u32,
    depth: usize,
    effects: &'a mut Vec<EffectHandle>,
}

fn invalid_hook_call() -> RenderError {
    RenderError::Thrown {
        message: "Invalid hook call. Hooks can only be called inside of the body of a function component.".into(),
    }
}

fn type_error(message: impl Into<String>) -> RenderError {
    RenderError::Type {
        message: message.into(),
    }
}

/// Whether a branch can leave its function
fn returns(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Return { .. } | Stmt::Throw { .. } | Stmt::Unsupported { .. } => true,
        Stmt::If { then, otherwise, .. } => returns(then) || returns(otherwise),
        _ => false,
    })
}

fn closure(func: &Arc<Function>, captured: HashMap<String, Value>, name: Option<String>) -> Value {
    Value::Function(Arc::new(Closure {
        func: Arc::clone(func),
        captured: Arc::new(captured),
        name,
    }))
}

impl Evaluator<'_> {
    fn run(&mut self, program: &Program) -> EvalResult<Vec<VisualNode>> {
        self.hoist(&program.body);

        let mut rendered = None;
        for stmt in &program.body {
            match stmt {
                Stmt::Expr {
                    expr: Expr::Call { callee, args },
                    ..
                } if self.is_render_entry(callee) => {
                    rendered = Some(self.render_entry(args)?);
                }
                Stmt::Return { .. } => {}
                _ => {
                    if let Flow::Return(_) = self.exec(stmt)? {
                        break;
                    }
                }
            }
        }
        rendered.ok_or(RenderError::NoRender)
    }

    fn is_render_entry(&self, callee: &Expr) -> bool {
        matches!(callee, Expr::Ident(name) if name == "render") && !self.globals.contains_key("render")
    }

    fn render_entry(&mut self, args: &[Expr]) -> EvalResult<Vec<VisualNode>> {
        let Some(arg) = args.first() else {
            return Ok(Vec::new());
        };
        match self.eval(arg)? {
            Value::Function(c) => {
                let name = c.name.clone().unwrap_or_else(|| "Anonymous".into());
                let result = self.call_component(&c, Value::Object(Vec::new()), name)?;
                self.value_to_nodes(result)
            }
            other => self.value_to_nodes(other),
        }
    }

    // ------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------

    /// Function declarations are visible before their statement
    fn hoist(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if let Stmt::Function { name, func, .. } = stmt {
                let value = closure(func, HashMap::new(), Some(name.clone()));
                self.set(name, value);
            }
        }
    }

    fn set(&mut self, name: &str, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => frame.insert(name.to_string(), value),
            None => self.globals.insert(name.to_string(), value),
        };
    }

    fn lookup(&self, name: &str) -> EvalResult<Value> {
        if let Some(v) = self.frames.last().and_then(|f| f.get(name)) {
            return Ok(v.clone());
        }
        if let Some(v) = self.globals.get(name) {
            return Ok(v.clone());
        }
        if self.scope.provides(name) {
            return Ok(Value::Builtin(name.to_string()));
        }
        Err(RenderError::Reference {
            name: name.to_string(),
        })
    }

    fn bind(&mut self, pattern: &Pattern, value: Value) -> EvalResult<()> {
        match pattern {
            Pattern::Ident(name) => {
                let value = match value {
                    Value::Function(c) if c.name.is_none() => Value::Function(Arc::new(Closure {
                        name: Some(name.clone()),
                        ..(*c).clone()
                    })),
                    other => other,
                };
                self.set(name, value);
            }
            Pattern::Array(items) => {
                if value.is_nullish() {
                    return Err(type_error(format!("{} is not iterable", value.to_display())));
                }
                for (i, item) in items.iter().enumerate() {
                    let Some(name) = item else { continue };
                    let element = match &value {
                        Value::Array(values) => values.get(i).cloned().unwrap_or(Value::Undefined),
                        Value::Opaque(raw) => Value::Opaque(format!("{}[{}]", raw, i)),
                        _ => Value::Undefined,
                    };
                    self.set(name, element);
                }
            }
            Pattern::Object { props, rest } => {
                if value.is_nullish() {
                    let key = props.first().map(|p| p.key.as_str()).unwrap_or("");
                    return Err(type_error(format!(
                        "Cannot destructure property '{}' of '{}' as it is {}.",
                        key,
                        value.to_display(),
                        value.to_display()
                    )));
                }
                for prop in props {
                    let mut v = match &value {
                        Value::Opaque(raw) => Value::Opaque(format!("{}.{}", raw, prop.key)),
                        other => other.get(&prop.key),
                    };
                    if matches!(v, Value::Undefined) {
                        if let Some(default) = &prop.default {
                            v = self.eval(default)?;
                        }
                    }
                    self.set(&prop.binding, v);
                }
                if let Some(rest) = rest {
                    let remaining = match &value {
                        Value::Object(entries) => entries
                            .iter()
                            .filter(|(k, _)| !props.iter().any(|p| &p.key == k))
                            .cloned()
                            .collect(),
                        _ => Vec::new(),
                    };
                    self.set(rest, Value::Object(remaining));
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements and calls
    // ------------------------------------------------------------------

    fn exec(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        match stmt {
            Stmt::Declare { decls, .. } => {
                for (pattern, init) in decls {
                    let value = match init {
                        Some(expr) => self.eval(expr)?,
                        None => Value::Undefined,
                    };
                    self.bind(pattern, value)?;
                }
                Ok(Flow::Normal)
            }
            Stmt::Function { .. } => Ok(Flow::Normal),
            Stmt::Return { value, .. } => Ok(Flow::Return(match value {
                Some(expr) => self.eval(expr)?,
                None => Value::Undefined,
            })),
            Stmt::Throw { value, .. } => {
                let thrown = self.eval(value)?;
                let message = match thrown {
                    Value::Error(message) | Value::Str(message) => message,
                    other => other.to_display(),
                };
                Err(RenderError::Thrown { message })
            }
            Stmt::Expr { expr, .. } => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::If {
                test,
                then,
                otherwise,
                ..
            } => {
                let value = self.eval(test)?;
                let branch = match value.truthiness() {
                    Some(true) => then,
                    Some(false) => otherwise,
                    // Without a value the preview cannot pick the branch that returns
                    None if returns(then) || returns(otherwise) => {
                        return Err(type_error(format!(
                            "unsupported condition: {}",
                            value.to_display()
                        )));
                    }
                    None => return Ok(Flow::Normal),
                };
                for stmt in branch {
                    if let Flow::Return(value) = self.exec(stmt)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Unsupported { keyword, .. } => {
                Err(type_error(format!("unsupported statement: {}", keyword)))
            }
        }
    }

    fn call_function(&mut self, callee: &Closure, args: Vec<Value>) -> EvalResult<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RenderError::Range {
                message: "Maximum call stack size exceeded".into(),
            });
        }
        self.depth += 1;
        self.frames.push((*callee.captured).clone());
        let result = self.call_body(&callee.func, args);
        self.frames.pop();
        self.depth -= 1;
        result
    }

    fn call_body(&mut self, func: &Function, args: Vec<Value>) -> EvalResult<Value> {
        let mut args = args.into_iter();
        for param in &func.params {
            let mut value = args.next().unwrap_or(Value::Undefined);
            if matches!(value, Value::Undefined) {
                if let Some(default) = &param.default {
                    value = self.eval(default)?;
                }
            }
            self.bind(&param.pattern, value)?;
        }
        match &func.body {
            FunctionBody::Expr(expr) => self.eval(expr),
            FunctionBody::Block(stmts) => {
                self.hoist(stmts);
                for stmt in stmts {
                    if let Flow::Return(value) = self.exec(stmt)? {
                        return Ok(value);
                    }
                }
                Ok(Value::Undefined)
            }
        }
    }

    /// Call a function as a component, giving it its own hook frame
    fn call_component(&mut self, callee: &Closure, props: Value, name: String) -> EvalResult<Value> {
        let instance = self.next_instance;
        self.next_instance += 1;
        self.hooks.push(HookFrame {
            instance,
            next_hook: 0,
            component: name,
        });
        let result = self.call_function(callee, vec![props]);
        self.hooks.pop();
        result
    }

    fn next_slot(&mut self) -> EvalResult<StateSlot> {
        let frame = self.hooks.last_mut().ok_or_else(invalid_hook_call)?;
        let slot = StateSlot {
            sandbox: self.sandbox,
            instance: frame.instance,
            hook: frame.next_hook,
        };
        frame.next_hook += 1;
        Ok(slot)
    }

    fn call_builtin(&mut self, path: &str, args: &[Expr]) -> EvalResult<Value> {
        let name = path.strip_prefix("React.").unwrap_or(path);
        match name {
            "useState" => {
                let slot = self.next_slot()?;
                let mut initial = self.eval_arg(args, 0)?;
                if let Value::Function(init) = &initial {
                    initial = self.call_function(&Arc::clone(init), Vec::new())?;
                }
                let current = self.scope.use_state(slot, initial);
                Ok(Value::Array(vec![current, Value::Setter]))
            }
            "useRef" => {
                let slot = self.next_slot()?;
                let initial = self.eval_arg(args, 0)?;
                let cell = Value::Object(vec![("current".to_string(), initial)]);
                Ok(self.scope.use_state(slot, cell))
            }
            "useEffect" | "useLayoutEffect" => {
                self.next_slot()?;
                let component = self
                    .hooks
                    .last()
                    .map(|h| h.component.clone())
                    .unwrap_or_default();
                let deps = match self.eval_arg(args, 1)? {
                    Value::Array(items) => Some(items.len()),
                    _ => None,
                };
                let handle = self.scope.schedule_effect(EffectRequest {
                    sandbox: self.sandbox,
                    component,
                    deps,
                });
                self.effects.push(handle);
                Ok(Value::Undefined)
            }
            "useMemo" => {
                self.next_slot()?;
                match self.eval_arg(args, 0)? {
                    Value::Function(f) => self.call_function(&f, Vec::new()),
                    other => Ok(other),
                }
            }
            "useCallback" => {
                self.next_slot()?;
                self.eval_arg(args, 0)
            }
            "createElement" => {
                let kind = self.eval_arg(args, 0)?;
                let props = self.eval_arg(args, 1)?;
                let mut children = Vec::new();
                for arg in args.iter().skip(2) {
                    let value = self.eval(arg)?;
                    children.extend(self.value_to_nodes(value)?);
                }
                let attrs = match props {
                    Value::Object(entries) => entries,
                    _ => Vec::new(),
                };
                let nodes = self.instantiate(kind, "createElement", attrs, children)?;
                Ok(Value::Nodes(nodes))
            }
            _ => Ok(Value::Opaque(format!("{}(…)", path))),
        }
    }

    fn eval_arg(&mut self, args: &[Expr], index: usize) -> EvalResult<Value> {
        match args.get(index) {
            Some(expr) => self.eval(expr),
            None => Ok(Value::Undefined),
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        Ok(match expr {
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Num(n) => Value::Num(*n),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Null => Value::Null,
            Expr::Undefined => Value::Undefined,
            Expr::Ident(name) => self.lookup(name)?,
            Expr::Member { object, property } => {
                let target = self.eval(object)?;
                self.member(target, property)?
            }
            Expr::Call { callee, args } => self.eval_call(callee, args)?,
            Expr::New { callee, args } => match callee.as_str() {
                "Error" | "TypeError" | "RangeError" => {
                    let message = match self.eval_arg(args, 0)? {
                        Value::Undefined => String::new(),
                        other => other.to_display(),
                    };
                    Value::Error(message)
                }
                _ => Value::Opaque(format!("new {}(…)", callee)),
            },
            Expr::Arrow(func) => {
                let captured = self.frames.last().cloned().unwrap_or_default();
                closure(func, captured, None)
            }
            Expr::Object(entries) => {
                let mut out: Vec<(String, Value)> = Vec::new();
                for entry in entries {
                    match entry {
                        ObjectEntry::Prop(key, value) => {
                            let value = self.eval(value)?;
                            out.push((key.clone(), value));
                        }
                        ObjectEntry::Spread(value) => {
                            if let Value::Object(more) = self.eval(value)? {
                                out.extend(more);
                            }
                        }
                    }
                }
                Value::Object(out)
            }
            Expr::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval(item)?);
                }
                Value::Array(out)
            }
            Expr::Jsx(node) => Value::Nodes(self.render_jsx(node)?),
            Expr::Opaque(raw) => Value::Opaque(raw.clone()),
        })
    }

    fn member(&self, target: Value, property: &str) -> EvalResult<Value> {
        match target {
            Value::Builtin(path) => Ok(Value::Builtin(format!("{}.{}", path, property))),
            Value::Opaque(raw) => Ok(Value::Opaque(format!("{}.{}", raw, property))),
            Value::Undefined | Value::Null => Err(type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                target.to_display(),
                property
            ))),
            other => Ok(other.get(property)),
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr]) -> EvalResult<Value> {
        let function = match callee {
            Expr::Member { object, property } => {
                let target = self.eval(object)?;
                if let Value::Array(items) = &target {
                    match property.as_str() {
                        "map" => return self.array_map(items, args),
                        "join" => {
                            let separator = match self.eval_arg(args, 0)? {
                                Value::Undefined => ",".to_string(),
                                other => other.to_display(),
                            };
                            let joined: Vec<String> = items.iter().map(Value::to_display).collect();
                            return Ok(Value::Str(joined.join(&separator)));
                        }
                        _ => {}
                    }
                }
                self.member(target, property)?
            }
            _ => self.eval(callee)?,
        };

        match function {
            Value::Builtin(path) => self.call_builtin(&path, args),
            Value::Function(c) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                self.call_function(&c, values)
            }
            Value::Setter => Ok(Value::Undefined),
            Value::Opaque(raw) => Ok(Value::Opaque(format!("{}(…)", raw))),
            _ => Err(type_error(format!(
                "{} is not a function",
                callee.path().unwrap_or_else(|| "expression".into())
            ))),
        }
    }

    fn array_map(&mut self, items: &[Value], args: &[Expr]) -> EvalResult<Value> {
        let Value::Function(f) = self.eval_arg(args, 0)? else {
            return Err(type_error("map callback is not a function"));
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            out.push(self.call_function(&f, vec![item.clone(), Value::Num(i as f64)])?);
        }
        Ok(Value::Array(out))
    }

    // ------------------------------------------------------------------
    // JSX
    // ------------------------------------------------------------------

    fn render_jsx(&mut self, node: &JsxNode) -> EvalResult<Vec<VisualNode>> {
        match node {
            JsxNode::Fragment(children) => self.render_children(children),
            JsxNode::Element(el) => {
                let attrs = self.eval_attrs(&el.attrs)?;
                let children = self.render_children(&el.children)?;
                if el.is_intrinsic() {
                    return self.instantiate(Value::Str(el.name.clone()), &el.name, attrs, children);
                }
                let kind = self.lookup_path(&el.name)?;
                self.instantiate(kind, &el.name, attrs, children)
            }
        }
    }

    /// Build output for an element type: a tag name or a component
    fn instantiate(
        &mut self,
        kind: Value,
        name: &str,
        attrs: Vec<(String, Value)>,
        children: Vec<VisualNode>,
    ) -> EvalResult<Vec<VisualNode>> {
        let attrs = attrs
            .into_iter()
            .filter(|(k, _)| k != "key" && k != "ref");
        match kind {
            Value::Str(tag) => {
                let props = attrs
                    .filter_map(|(name, value)| value.to_prop().map(|value| Prop { name, value }))
                    .collect();
                Ok(vec![self.scope.create_element(&tag, props, children)])
            }
            Value::Function(c) => {
                let mut props: Vec<(String, Value)> = attrs.collect();
                if !children.is_empty() {
                    props.push(("children".to_string(), Value::Nodes(children)));
                }
                let component = c.name.clone().unwrap_or_else(|| name.to_string());
                let result = self.call_component(&c, Value::Object(props), component)?;
                self.value_to_nodes(result)
            }
            Value::Builtin(path) if path == "Fragment" || path.ends_with(".Fragment") => Ok(children),
            Value::Builtin(_) | Value::Opaque(_) => Ok(vec![VisualNode::Opaque {
                source: format!("<{} />", name),
            }]),
            other => Err(type_error(format!(
                "Element type is invalid: expected a string (for built-in components) or a function (for composite components) but got: {}",
                other.to_display()
            ))),
        }
    }

    fn lookup_path(&self, path: &str) -> EvalResult<Value> {
        let mut parts = path.split('.');
        let first = parts.next().unwrap_or_default();
        let mut value = self.lookup(first)?;
        for part in parts {
            value = self.member(value, part)?;
        }
        Ok(value)
    }

    fn eval_attrs(&mut self, attrs: &[JsxAttr]) -> EvalResult<Vec<(String, Value)>> {
        let mut out = Vec::with_capacity(attrs.len());
        for attr in attrs {
            match attr {
                JsxAttr::Named { name, value } => {
                    let value = match value {
                        Some(expr) => self.eval(expr)?,
                        None => Value::Bool(true),
                    };
                    out.push((name.clone(), value));
                }
                JsxAttr::Spread(expr) => {
                    if let Value::Object(entries) = self.eval(expr)? {
                        out.extend(entries);
                    }
                }
            }
        }
        Ok(out)
    }

    fn render_children(&mut self, children: &[JsxChild]) -> EvalResult<Vec<VisualNode>> {
        let mut out = Vec::new();
        for child in children {
            match child {
                JsxChild::Text(text) => out.push(VisualNode::Text { text: text.clone() }),
                JsxChild::Expr(expr) => {
                    let value = self.eval(expr)?;
                    out.extend(self.value_to_nodes(value)?);
                }
                JsxChild::Node(node) => out.extend(self.render_jsx(node)?),
            }
        }
        Ok(out)
    }

    fn value_to_nodes(&self, value: Value) -> EvalResult<Vec<VisualNode>> {
        Ok(match value {
            Value::Undefined | Value::Null | Value::Bool(_) => Vec::new(),
            Value::Str(text) => vec![VisualNode::Text { text }],
            Value::Num(n) => vec![VisualNode::Text {
                text: format_number(n),
            }],
            Value::Nodes(nodes) => nodes,
            Value::Array(items) => {
                let mut out = Vec::new();
                for item in items {
                    out.extend(self.value_to_nodes(item)?);
                }
                out
            }
            Value::Opaque(source) => vec![VisualNode::Opaque { source }],
            Value::Function(_) | Value::Builtin(_) | Value::Setter => Vec::new(),
            Value::Object(entries) => {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                return Err(type_error(format!(
                    "Objects are not valid as a React child (found: object with keys {{{}}})",
                    keys.join(", ")
                )));
            }
            Value::Error(_) => {
                return Err(type_error(
                    "Objects are not valid as a React child (found: [object Error])",
                ))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::jsx::parse;
    use crate::preview::scope::StandardScope;
    use crate::preview::tree::VisualTree;

    fn run(source: &str) -> (EvalResult<VisualTree>, Vec<EffectHandle>, StandardScope) {
        let scope = StandardScope::new();
        let mut effects = Vec::new();
        let program = parse(source).expect("test source parses");
        let result = evaluate(&program, &scope, 1, &mut effects).map(VisualTree::new);
        (result, effects, scope)
    }

    fn render_ok(source: &str) -> VisualTree {
        match run(source).0 {
            Ok(tree) => tree,
            Err(e) => panic!("render failed: {}", e),
        }
    }

    #[test]
    fn test_renders_component_with_props() {
        let tree = render_ok(
            r#"
const Greeting = ({ name, punctuation = "!" }) => <h1 className="title">Hello {name}{punctuation}</h1>;
render(<Greeting name="Ada" />);
"#,
        );
        assert_eq!(tree.text(), "Hello Ada!");
        let h1 = tree.find_by_tag("h1");
        assert_eq!(h1[0].prop("className").and_then(|p| p.as_str()), Some("title"));
    }

    #[test]
    fn test_use_state_initial_value() {
        let tree = render_ok(
            "const Counter = () => {\n  const [count, setCount] = useState(3);\n  return <span onClick={() => setCount(count + 1)}>{count}</span>;\n};\nrender(<Counter />);",
        );
        assert_eq!(tree.text(), "3");
    }

    #[test]
    fn test_children_and_fragments() {
        let tree = render_ok(
            "const Card = ({ children }) => <section>{children}</section>;\nrender(<><Card><p>a</p><p>b</p></Card></>);",
        );
        assert_eq!(tree.find_by_tag("p").len(), 2);
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn test_array_map_renders_list() {
        let tree = render_ok(
            "const items = ['x', 'y', 'z'];\nconst List = () => <ul>{items.map((item) => <li key={item}>{item}</li>)}</ul>;\nrender(<List />);",
        );
        assert_eq!(tree.find_by_tag("li").len(), 3);
        assert_eq!(tree.text(), "xyz");
        assert!(tree.find_by_tag("li")[0].prop("key").is_none());
    }

    #[test]
    fn test_render_accepts_function_and_component_reference() {
        assert_eq!(render_ok("render(() => <b>hi</b>);").text(), "hi");
        assert_eq!(
            render_ok("function App() { return <i>ok</i>; }\nrender(App);").text(),
            "ok"
        );
    }

    #[test]
    fn test_unknown_identifier_is_reference_error() {
        let (result, _, _) = run("const App = () => <p>{missing}</p>;\nrender(<App />);");
        assert_eq!(
            result.unwrap_err(),
            RenderError::Reference {
                name: "missing".into()
            }
        );
    }

    #[test]
    fn test_unknown_component_is_reference_error() {
        let (result, _, _) = run("render(<Nope />);");
        assert!(matches!(result, Err(RenderError::Reference { name }) if name == "Nope"));
    }

    #[test]
    fn test_throw_is_error_with_message() {
        let (result, _, _) = run("const App = () => { throw new Error('boom'); };\nrender(<App />);");
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Error: boom");
    }

    #[test]
    fn test_no_render_call() {
        let (result, _, _) = run("const App = () => <div />;");
        assert_eq!(result.unwrap_err(), RenderError::NoRender);
    }

    #[test]
    fn test_infinite_recursion_is_range_error() {
        let (result, _, _) = run("const Loop = () => <Loop />;\nrender(<Loop />);");
        assert!(matches!(result, Err(RenderError::Range { .. })));
    }

    #[test]
    fn test_effects_are_reported_even_on_failure() {
        let (result, effects, scope) = run(
            "const App = () => {\n  useEffect(() => {}, []);\n  throw new Error('late');\n};\nrender(<App />);",
        );
        assert!(result.is_err());
        assert_eq!(effects.len(), 1);
        assert_eq!(scope.active_effect_count(), 1);
    }

    #[test]
    fn test_hook_outside_component() {
        let (result, _, _) = run("const [a] = useState(1);\nrender(<p />);");
        assert!(matches!(result, Err(RenderError::Thrown { .. })));
    }

    #[test]
    fn test_opaque_children_become_placeholders() {
        let tree = render_ok("const n = 2;\nrender(<p>{n * 2}</p>);");
        match tree.find_by_tag("p")[0] {
            VisualNode::Element { children, .. } => {
                assert!(matches!(children.as_slice(), [VisualNode::Opaque { .. }]));
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_use_ref_and_style_object() {
        let tree = render_ok(
            "const App = () => {\n  const ref = useRef(null);\n  return <div ref={ref} style={{ color: '#fff' }} />;\n};\nrender(<App />);",
        );
        let div = tree.find_by_tag("div")[0];
        assert!(div.prop("ref").is_none());
        assert!(matches!(div.prop("style"), Some(crate::preview::tree::PropValue::Object(_))));
    }

    #[test]
    fn test_read_of_undefined_is_type_error() {
        let (result, _, _) = run("const user = undefined;\nrender(<p>{user.name}</p>);");
        assert!(matches!(result, Err(RenderError::Type { .. })));
    }

    #[test]
    fn test_if_returns_from_taken_branch() {
        let tree = render_ok(
            "const App = () => {\n  if (true) {\n    return <p>x</p>;\n  }\n  return <p>y</p>;\n};\nrender(<App />);",
        );
        assert_eq!(tree.text(), "x");
    }

    #[test]
    fn test_else_if_chain_on_props() {
        let source = r#"
function Badge({ level, fallback }) {
  if (level) {
    return <b>{level}</b>;
  } else if (fallback) {
    return <i>{fallback}</i>;
  } else return <b>none</b>;
}
render(<Badge fallback="n/a" />);
"#;
        let tree = render_ok(source);
        assert_eq!(tree.find_by_tag("i").len(), 1);
        assert_eq!(tree.text(), "n/a");
    }

    #[test]
    fn test_unknown_condition_before_return_is_type_error() {
        let (result, _, _) = run(
            "function Badge({ level }) {\n  if (!level) {\n    return <b>zero</b>;\n  }\n  return <b>{level}</b>;\n}\nrender(<Badge level={0} />);",
        );
        match result {
            Err(RenderError::Type { message }) => {
                assert_eq!(message, "unsupported condition: !level")
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_if_without_return_on_unknown_condition_is_skipped() {
        let tree = render_ok(
            "const App = ({ n }) => {\n  if (n > 2) {\n    console.log(n);\n  }\n  return <p>ok</p>;\n};\nrender(<App n={3} />);",
        );
        assert_eq!(tree.text(), "ok");
    }

    #[test]
    fn test_skipped_loop_with_return_is_reported() {
        let (result, _, _) = run(
            "const App = () => {\n  for (const x of [1]) {\n    return <p>{x}</p>;\n  }\n  return <p>y</p>;\n};\nrender(<App />);",
        );
        match result {
            Err(RenderError::Type { message }) => assert_eq!(message, "unsupported statement: for"),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
