//! Custom handler runner.
//!
//! Executes user-supplied snippets inside an embedded QuickJS interpreter.
//! Handlers see only the documented bindings (`context`, `params`,
//! `component`, `host`, `console`) and no ambient global state. Values cross
//! the boundary as JSON in both directions, so a handler cannot retain
//! references into the engine.

use regex::Regex;
use rquickjs::{Context as JsContext, FromJs, Runtime as JsRuntime};
use serde_json::Value;

use crate::{LinkflowError, Result};

/// The fixed set of named bindings a handler executes against.
#[derive(Debug, Clone)]
pub struct HandlerBindings {
    /// Source/target snapshots, raw event data and the source value.
    pub context: Value,
    /// The resolved parameter bag.
    pub params: Value,
    /// Alias for the target component snapshot.
    pub component: Value,
    /// Host environment access (currently the engine environment table).
    pub host: Value,
}

/// Everything a handler run produces.
#[derive(Debug, Clone)]
pub struct HandlerOutcome {
    /// The handler's return value (`null` when it returned nothing).
    pub result: Value,
    /// Post-execution state of the `component` binding. The executor reads
    /// this back to apply in-place mutations the handler made.
    pub component: Value,
    /// Captured `console` output, in emission order.
    pub logs: Vec<String>,
}

pub struct HandlerRunner;

impl HandlerRunner {
    /// Evaluate an expression against a payload bound as `data`.
    ///
    /// Used by `expression` parameter mappings. A resolved `undefined`
    /// normalizes to `null` so the mapper's default-value rule applies.
    pub fn eval_expression(
        expression: &str,
        data: &Value,
    ) -> Result<Value> {
        let data = serde_json::to_string(data)?;
        let source = format!("(function(data) {{ var __r = ({expression}); return JSON.stringify(__r === undefined ? null : __r); }})({data})");

        Self::eval_json(&source, "JS_EVAL_ERROR")
    }

    /// Execute handler code with the standard bindings.
    ///
    /// If the code is a named function declaration (optionally `async`), the
    /// declared name is auto-detected and an invocation with the standard
    /// bindings is appended, so authors may write either a bare function body
    /// or a full declaration. `async` declarations run without being awaited.
    pub fn run(
        code: &str,
        bindings: &HandlerBindings,
    ) -> Result<HandlerOutcome> {
        let mut body = code.trim().to_string();
        if let Some(func_name) = Self::extract_function_name(&body) {
            body = format!("{body}\n\nreturn {func_name}(context, params, component);");
        }

        let context = serde_json::to_string(&bindings.context)?;
        let params = serde_json::to_string(&bindings.params)?;
        let component = serde_json::to_string(&bindings.component)?;
        let host = serde_json::to_string(&bindings.host)?;

        let source = format!(
            "(function(context, params, component, host) {{\n\
             var __logs = [];\n\
             var console = {{}};\n\
             console.log = function() {{ __logs.push(Array.prototype.slice.call(arguments).map(function(x) {{ return typeof x === 'object' ? JSON.stringify(x) : String(x); }}).join(' ')); }};\n\
             console.warn = console.log;\n\
             console.error = console.log;\n\
             var __r = (function(context, params, component, host, console) {{\n{body}\n}})(context, params, component, host, console);\n\
             return JSON.stringify({{ result: __r === undefined ? null : __r, component: component, logs: __logs }});\n\
             }})({context}, {params}, {component}, {host})"
        );

        let value = Self::eval_json(&source, "JS_EXEC_ERROR")?;
        Ok(HandlerOutcome {
            result: value.get("result").cloned().unwrap_or(Value::Null),
            component: value.get("component").cloned().unwrap_or(Value::Null),
            logs: value.get("logs").and_then(|v| serde_json::from_value(v.clone()).ok()).unwrap_or_default(),
        })
    }

    /// Extract the declared function name when the code opens with a
    /// (possibly async) function declaration.
    fn extract_function_name(code: &str) -> Option<String> {
        // Match: function handle(...) or async function handle (...
        let re = Regex::new(r"^(?:async\s+)?function\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*\(").ok()?;
        re.captures(code).map(|caps| caps[1].to_string())
    }

    /// Evaluate a source string expected to produce a JSON string.
    fn eval_json(
        source: &str,
        ecode: &str,
    ) -> Result<Value> {
        let runtime = JsRuntime::new().map_err(|e| LinkflowError::Runtime(e.to_string()))?;
        let ctx = JsContext::full(&runtime).map_err(|e| LinkflowError::Runtime(e.to_string()))?;

        ctx.with(|ctx| {
            let result: std::result::Result<String, _> = ctx.eval(source);
            match result {
                Ok(json_str) => serde_json::from_str(&json_str).map_err(|e| LinkflowError::Runtime(e.to_string())),
                Err(rquickjs::Error::Exception) => {
                    let exception = rquickjs::Exception::from_js(&ctx, ctx.catch()).unwrap();
                    Err(LinkflowError::Exception {
                        ecode: ecode.to_string(),
                        message: exception.message().unwrap_or_default(),
                    })
                }
                Err(e) => Err(LinkflowError::Runtime(e.to_string())),
            }
        })
    }
}
