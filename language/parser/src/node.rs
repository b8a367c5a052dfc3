/// The parse-tree adapter (§4.2): every node exposes a `rule_name`, a
/// token `value` where applicable, and ordered children. Punctuation
/// tokens (`.`, `,`, `;`, `{`, `}`) are consumed by the parser and never
/// retained as nodes — the walker only ever needs the semantically
/// meaningful pieces, not raw grammar artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Terminal { value: String },
    NonTerminal { rule_name: &'static str, children: Vec<Node> },
}

impl Node {
    pub fn terminal(value: impl Into<String>) -> Self {
        return Node::Terminal { value: value.into() };
    }

    pub fn non_terminal(rule_name: &'static str, children: Vec<Node>) -> Self {
        return Node::NonTerminal { rule_name, children };
    }

    pub fn rule_name(&self) -> &'static str {
        return match self {
            Node::Terminal { .. } => "TERMINAL",
            Node::NonTerminal { rule_name, .. } => rule_name,
        };
    }

    pub fn value(&self) -> Option<&str> {
        return match self {
            Node::Terminal { value } => Some(value.as_str()),
            Node::NonTerminal { .. } => None,
        };
    }

    pub fn children(&self) -> &[Node] {
        return match self {
            Node::Terminal { .. } => &[],
            Node::NonTerminal { children, .. } => children,
        };
    }

    /// Convenience for nodes whose children are all terminals (dotrefs,
    /// inheritance lists, template-parameter lists): collects each
    /// child's value in order.
    pub fn terminal_values(&self) -> Vec<String> {
        return self.children().iter().filter_map(|child| child.value().map(|v| v.to_string())).collect();
    }
}

// Rule-name constants, matching §6's "Recognized parse-tree rule names".
pub const RULE_GRAMMAR: &str = "_grammar";
pub const RULE_CLASS_GRAM: &str = "_class_gram";
pub const RULE_GENERIC_GRAM: &str = "_generic_gram";
pub const RULE_SINGLE_GRAM: &str = "_single_gram";
pub const RULE_ALIAS_GRAM: &str = "_alias_gram";
pub const RULE_FLOW_GRAM: &str = "_flow_gram";

pub const RULE_CLASS_BASE_STUB: &str = "_class_base_stub";
pub const RULE_CLASS_BASE_IMPL: &str = "_class_base_impl";
pub const RULE_CLASS_INH_STUB: &str = "_class_inh_stub";
pub const RULE_CLASS_INH_IMPL: &str = "_class_inh_impl";
pub const RULE_CLASS_INH_LIST: &str = "_class_inh_list";

pub const RULE_GENERIC_STUB: &str = "_generic_stub";
pub const RULE_GENERIC_IMPL: &str = "_generic_impl";
pub const RULE_CSEP_CAPS: &str = "_csep_caps";

pub const RULE_SINGLE_STUB: &str = "_single_stub";
pub const RULE_SINGLE_IMPL: &str = "_single_impl";

pub const RULE_CGS_BLOCK: &str = "_cgs_block";
pub const RULE_CGS_ASYNC_STUB: &str = "_cgs_async_stub";
pub const RULE_CGS_ASYNC_IMPL: &str = "_cgs_async_impl";
pub const RULE_CGS_SYNC_STUB: &str = "_cgs_sync_stub";
pub const RULE_CGS_SYNC_IMPL: &str = "_cgs_sync_impl";
pub const RULE_CGS_VAR_STUB: &str = "_cgs_var_stub";
pub const RULE_CGS_VAR_READY: &str = "_cgs_var_ready";
pub const RULE_METHOD_SIG: &str = "_method_sig";
pub const RULE_SIG_PAIR: &str = "_sig_pair";

pub const RULE_CB_GRAMMAR: &str = "_cb_grammar";
pub const RULE_CB_SYNC_COPY: &str = "_cb_sync_copy";
pub const RULE_CB_SYNC_FROM: &str = "_cb_sync_from";
pub const RULE_CB_ASYNC_FROM: &str = "_cb_async_from";
pub const RULE_CB_VAR_STUB: &str = "_cb_var_stub";
pub const RULE_CB_VAR_READY: &str = "_cb_var_ready";
pub const RULE_CB_VAR_ASYNC_SET: &str = "_cb_var_async_set";
pub const RULE_CB_VAR_SYNC_SET: &str = "_cb_var_sync_set";
pub const RULE_CB_NOTE: &str = "_cb_note";
pub const RULE_CB_RETURN: &str = "_cb_return";
pub const RULE_DOTREF: &str = "_dotref";
pub const RULE_ARGLIST: &str = "_arglist";

pub const RULE_FLOW_STUB: &str = "_flow_stub";
pub const RULE_FLOW_IMPL: &str = "_flow_impl";
