//! Heuristics for machine-written code that drifts from a real
//! implementation: stub bodies, swallowed errors, and APIs borrowed from the
//! wrong language.

use regex::RegexBuilder;

use super::{pattern_check, scan, BlockContext, CheckOutcome};
use crate::enforcement::ViolationNotice;
use crate::rules::{EnforcementLevel, RuleSet};

const OVERSIMPLIFICATION_PATTERNS: &[&str] = &[
    // empty or pass-only bodies
    r"def\s+\w+\([^)]*\):\s*pass\s*$",
    r"def\s+\w+\([^)]*\):\s*\.\.\.",
    r"function\s+\w+\([^)]*\)\s*\{\s*\}",
    r"\w+\s*=\s*\([^)]*\)\s*=>\s*\{\s*\}",
    r"=>\s*(?:null|undefined|None)\s*[;\n]",
    r"lambda\s+[^:]+:\s*None",
    r"func\s+\w+\([^)]*\)\s*\{\s*\}",
    r"fn\s+\w+\([^)]*\)\s*\{\s*\}",
    // trivial returns
    r"def\s+\w+\([^)]*\):\s*return\s+True\s*$",
    r"def\s+\w+\([^)]*\):\s*return\s+False\s*$",
    r"def\s+\w+\([^)]*\):\s*return\s+None\s*$",
    r"def\s+\w+\([^)]*\):\s*return\s+0\s*$",
    r#"def\s+\w+\([^)]*\):\s*return\s*""\s*$"#,
    r"def\s+\w+\([^)]*\):\s*return\s*\[\]\s*$",
    r"def\s+\w+\([^)]*\):\s*return\s*\{\}\s*$",
    r#"function\s+\w+[^{]*\{\s*return\s+(?:true|false|null|undefined|0|""|''|\[\]|\{\})\s*;?\s*\}"#,
    // passthrough validators
    r"def\s+validate\w*\([^)]+\):\s*return\s+True",
    r"def\s+check\w*\([^)]+\):\s*return\s+True",
    r"def\s+is_\w+\([^)]+\):\s*return\s+True",
    // not-implemented markers
    r"raise\s+NotImplementedError",
    r#"throw\s+new\s+Error\(["']not\s+implemented"#,
    r#"throw\s+new\s+Error\(["']TODO"#,
    r#"panic!\(["']not\s+implemented"#,
    r#"panic!\(["']todo"#,
    r"unimplemented!\(\)",
    r"todo!\(\)",
    // comment-only bodies
    r"#\s*implementation\s+here",
    r"//\s*implementation\s+here",
    r"/\*\s*\.\.\.\s*\*/",
    r"#\s*your\s+code\s+here",
    r"//\s*TODO:?\s*implement",
    r"#\s*add\s+(?:your|actual|real)\s+(?:code|logic|implementation)",
    // fabricated results
    r#"return\s+\{["']status["']:\s*["'](?:ok|success|done)["']"#,
    r#"print\(["'](?:Processing|Done|Complete|Success|Working)["']\)\s*$"#,
];

const INCOMPLETE_LOGIC_PATTERNS: &[&str] = &[
    // swallowed errors
    r"except:\s*pass",
    r"except\s+\w+(?:\s+as\s+\w+)?:\s*pass",
    r"except\s+\w+(?:\s+as\s+\w+)?:\s*\.\.\.",
    r"catch\s*\([^)]*\)\s*\{\s*\}",
    r"catch\s*\([^)]*\)\s*\{\s*//",
    r#"except[^:]*:\s*print\(["'](?:error|Error|ERROR)["']\)"#,
    r"catch\s*\(\w+\)\s*\{\s*console\.log\(\w+\)\s*;?\s*\}",
    r"rescue\s*(?:=>)?\s*(?:nil|end)",
    r"except[^:]*:\s*return\s+None",
    r#"except[^:]*:\s*return\s+(?:False|\[\]|\{\}|""|0)"#,
    // generic raises
    r"raise\s+Exception\s*$",
    r#"raise\s+Exception\(["'](?:error|Error|e|err|exception)["']\)"#,
    r#"raise\s+Exception\(["'](?:something went wrong|an error occurred|failed|unknown error)["']\)"#,
    r#"raise\s+Exception\(["'](?:todo|fixme|implement|not done)["']\)"#,
    r#"throw\s+new\s+Error\(["'](?:error|Error|e|err)["']\)"#,
    r#"throw\s+new\s+Error\(["'](?:something went wrong|failed|unknown)["']\)"#,
    r#"raise\s+ValueError\(["'](?:invalid|bad|wrong)\s*(?:value|input|data)?["']\)"#,
    // degenerate loops
    r"for\s+\w+\s+in\s+\w+:\s*return\s+\w+",
    r"for\s+\w+\s+in\s+\w+:\s*break",
    r"for\s*\([^)]*\)\s*\{\s*return",
    r"while\s+True:\s*break",
    r"for\s+\w+\s+in\s+range\(1\)",
    // constant conditions
    r"if\s+True\s*:",
    r"if\s+False\s*:",
    r"if\s*\(\s*true\s*\)",
    r"if\s*\(\s*false\s*\)",
    r"if\s+1\s*:",
    r"if\s+0\s*:",
    r"if\s+.*:\s*pass\s*$",
    r"else:\s*pass\s*$",
    // placeholder messages
    r#"["'](?:Something went wrong|An error occurred|Failed|Unknown error|Unexpected error)["']"#,
];

/// (pattern, suggestion) for JavaScript idioms inside Python.
const PYTHON_HALLUCINATIONS: &[(&str, &str)] = &[
    (r"\.length\b", ".length is JavaScript; in Python, use len()"),
    (r"\.push\(", ".push() is JavaScript; in Python, use .append()"),
    (r"\.forEach\(", ".forEach() is JavaScript; in Python, use a for loop"),
    (r"\.indexOf\(", ".indexOf() is JavaScript; in Python, use .index() or 'in'"),
    (r"\.includes\(", ".includes() is JavaScript; in Python, use 'in' operator"),
    (r"\.toString\(", ".toString() is JavaScript; in Python, use str()"),
    (r"\.toUpperCase\(", ".toUpperCase() is JavaScript; in Python, use .upper()"),
    (r"\.toLowerCase\(", ".toLowerCase() is JavaScript; in Python, use .lower()"),
    (r"\.trim\(", ".trim() is JavaScript; in Python, use .strip()"),
    (r"\.charAt\(", ".charAt() is JavaScript; in Python, use indexing []"),
    (r"\.substring\(", ".substring() is JavaScript; in Python, use slicing [:]"),
    (r"\.splice\(", ".splice() is JavaScript; in Python, use slicing or del"),
    (r"\.concat\(", ".concat() is JavaScript; in Python, use + or .extend()"),
    (r"console\.log\(", "console.log() is JavaScript; in Python, use print()"),
    (r"\btypeof\s+", "typeof is JavaScript; in Python, use type()"),
    (r"\binstanceof\b", "instanceof is JavaScript; in Python, use isinstance()"),
    (r"===", "=== is JavaScript; in Python, use =="),
    (r"!==", "!== is JavaScript; in Python, use !="),
    (r"\bnull\b", "null is JavaScript; in Python, use None"),
    (r"\bundefined\b", "undefined is JavaScript; Python has no equivalent (use None)"),
    (r"\bconst\s+\w+\s*=", "const is JavaScript; in Python, just assign variables"),
    (r"\blet\s+\w+\s*=", "let is JavaScript; in Python, just assign variables"),
    (r"\bvar\s+\w+\s*=", "var is JavaScript; in Python, just assign variables"),
    (r"json\.stringify\(", "json.stringify() is JavaScript; in Python, use json.dumps()"),
    (r"json\.parse\(", "json.parse() is JavaScript; in Python, use json.loads()"),
    (r"Math\.round\(", "Math.round() is JavaScript; in Python, use round()"),
    (r"Math\.floor\(", "Math.floor() is JavaScript; in Python, use math.floor() or int()"),
    (r"Math\.ceil\(", "Math.ceil() is JavaScript; in Python, use math.ceil()"),
    (r"Math\.abs\(", "Math.abs() is JavaScript; in Python, use abs()"),
    (r"Math\.random\(", "Math.random() is JavaScript; in Python, use random.random()"),
    (r"Math\.max\(", "Math.max() is JavaScript; in Python, use max()"),
    (r"Math\.min\(", "Math.min() is JavaScript; in Python, use min()"),
    (r"list\.flatten\(", "list.flatten() doesn't exist; use itertools.chain.from_iterable()"),
    (r"dict\.to_json\(", "dict.to_json() doesn't exist; use json.dumps()"),
    (r"\.toInt\(", ".toInt() doesn't exist in Python; use int()"),
    (r"\.toFloat\(", ".toFloat() doesn't exist in Python; use float()"),
    (r"\.size\(\)", ".size() doesn't exist for sequences in Python; use len()"),
    (r"\bArray\(", "Array() is JavaScript; in Python, use list()"),
    (r"Object\.keys\(", "Object.keys() is JavaScript; in Python, use .keys()"),
    (r"Object\.values\(", "Object.values() is JavaScript; in Python, use .values()"),
    (r"\bString\(", "String() is JavaScript; in Python, use str()"),
    (r"\bNumber\(", "Number() is JavaScript; in Python, use int() or float()"),
    (r"\bBoolean\(", "Boolean() is JavaScript; in Python, use bool()"),
    (r"\bthis\.\w+", "this.x is JavaScript; in Python, use self.x"),
    (r"\basync\s+function\b", "async function is JavaScript; in Python, use async def"),
];

/// (pattern, suggestion) for Python idioms inside JavaScript.
const JS_HALLUCINATIONS: &[(&str, &str)] = &[
    (r"\bprint\(", "print() is Python; in JavaScript, use console.log()"),
    (r"\blen\(", "len() is Python; in JavaScript, use .length"),
    (r"\brange\(", "range() is Python; in JavaScript, use for loop or Array.from()"),
    (r"\bdef\s+\w+", "def is Python; in JavaScript, use function or arrow functions"),
    (r"\belif\b", "elif is Python; in JavaScript, use else if"),
    (r"\bTrue\b", "True is Python; in JavaScript, use true (lowercase)"),
    (r"\bFalse\b", "False is Python; in JavaScript, use false (lowercase)"),
    (r"\bNone\b", "None is Python; in JavaScript, use null"),
    (r"\band\s", "and is Python; in JavaScript, use &&"),
    (r"\bor\s", "or is Python; in JavaScript, use ||"),
    (r"\bnot\s", "not is Python; in JavaScript, use !"),
    (r"\b__\w+__\b", "Dunder methods (__x__) are Python; no equivalent in JavaScript"),
    (r"\.append\(", ".append() is Python; in JavaScript, use .push()"),
    (r"\.extend\(", ".extend() is Python; in JavaScript, use .concat() or spread"),
    (r"\.strip\(", ".strip() is Python; in JavaScript, use .trim()"),
    (r"\.upper\(", ".upper() is Python; in JavaScript, use .toUpperCase()"),
    (r"\.lower\(", ".lower() is Python; in JavaScript, use .toLowerCase()"),
    (r"\.items\(\)", ".items() is Python; in JavaScript, use Object.entries()"),
    (r"\barray\.contains\(", "array.contains() doesn't exist; use .includes()"),
    (r"\bstring\.contains\(", "string.contains() doesn't exist; use .includes()"),
    (r"Array\.flatten\(", "Array.flatten() doesn't exist; use .flat()"),
    (r"JSON\.load\(", "JSON.load() is Python-style; in JavaScript, use JSON.parse()"),
    (r"JSON\.dump\(", "JSON.dump() is Python-style; in JavaScript, use JSON.stringify()"),
    (r"console\.write\(", "console.write() doesn't exist; use console.log()"),
    (r"Math\.sum\(", "Math.sum() doesn't exist; use array.reduce((a,b) => a+b, 0)"),
    (r"fs\.readfile\(", "fs.readfile() wrong case; use fs.readFile() or fs.readFileSync()"),
    (r"\bself\.\w+", "self.x is Python; in JavaScript, use this.x"),
    (r"\basync\s+def\b", "async def is Python; in JavaScript, use async function"),
];

pub fn check_oversimplification(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    pattern_check(
        ctx,
        &rules.code_quality.no_oversimplification,
        "code_quality.no_oversimplification",
        default,
        OVERSIMPLIFICATION_PATTERNS,
        |found| {
            ViolationNotice::new(default, format!("Oversimplified code: \"{found}\""))
                .help(
                    "This looks like a stub or trivial implementation.\n\
                     LLMs often produce minimal code that passes syntax checks but lacks real logic.\n\
                     Implement the actual business logic instead of a placeholder.",
                )
                .examples(
                    "def validate(data): return True",
                    "def validate(data):\n    if not isinstance(data, dict): raise TypeError(...)\n    ...",
                )
        },
    )
}

pub fn check_incomplete_logic(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    pattern_check(
        ctx,
        &rules.code_quality.no_incomplete_logic,
        "code_quality.no_incomplete_logic",
        default,
        INCOMPLETE_LOGIC_PATTERNS,
        |found| {
            ViolationNotice::new(default, format!("Incomplete logic: \"{found}\""))
                .help(
                    "This code has logic gaps that indicate shortcuts or lazy implementation.\n\
                     Common issues: empty catch blocks, generic error messages, degenerate loops,\n\
                     always-true/false conditions, or swallowed exceptions.",
                )
                .examples(
                    "except Exception: pass  # swallows all errors",
                    "except ValueError as e:\n    logger.error(f\"Validation failed: {e}\")\n    raise",
                )
        },
    )
}

fn hallucination_table(language: &str) -> &'static [(&'static str, &'static str)] {
    match language {
        "python" => PYTHON_HALLUCINATIONS,
        "javascript" | "js" | "node" => JS_HALLUCINATIONS,
        _ => &[],
    }
}

/// Comment syntax from the other language, as (pattern, suggestion).
fn foreign_comment(language: &str) -> Option<(&'static str, &'static str)> {
    match language {
        "python" => Some((r"^\s*//\s+", "// comments are JavaScript; in Python, use #")),
        "javascript" | "js" => Some((r"^\s*#\s+", "# comments are Python; in JavaScript, use //")),
        _ => None,
    }
}

pub fn check_hallucinated_apis(
    ctx: &BlockContext<'_>,
    rules: &RuleSet,
    default: EnforcementLevel,
) -> CheckOutcome {
    const RULE: &str = "code_quality.no_hallucinated_apis";
    let cfg = &rules.code_quality.no_hallucinated_apis;
    if !cfg.enabled {
        return CheckOutcome::Skipped;
    }
    let level = cfg.level.unwrap_or(default);
    let lang = ctx.language;
    let notice = |what: String, help: &str| {
        ViolationNotice::new(level, what)
            .at(ctx.location())
            .rule(RULE)
            .help(help)
    };

    for (pattern, suggestion) in hallucination_table(lang) {
        let Ok(re) = RegexBuilder::new(pattern)
            .case_insensitive(!cfg.case_sensitive)
            .build()
        else {
            continue;
        };
        if let Some(m) = re.find(ctx.code) {
            let what = format!("Hallucinated API in {lang} block: \"{}\"", m.as_str());
            return CheckOutcome::violation(RULE, notice(what, suggestion));
        }
    }

    if cfg.check_cross_language {
        if let Some((pattern, suggestion)) = foreign_comment(lang) {
            if let Some(found) = scan(ctx.code, &[pattern], false, &[]) {
                let what = format!("Cross-language confusion in {lang} block: \"{found}\"");
                return CheckOutcome::violation(RULE, notice(what, suggestion));
            }
        }
    }

    if let Some(found) = scan(ctx.code, &cfg.custom_patterns, true, &[]) {
        let what = format!("Hallucinated API pattern in {lang} block: \"{found}\"");
        return CheckOutcome::violation(
            RULE,
            notice(what, "This pattern matches a known hallucinated or incorrect API usage"),
        );
    }
    CheckOutcome::pass(RULE, level)
}
