// Macros to simplify rule set declarations

/// Builds a [`RuleSet`](crate::rewriting::rule::RuleSet) from single rules and rule groups.
///
/// ```
/// use vinculum::rewriting::rules::{cse_bind, lift_let_rules};
///
/// let rules = vinculum::rule_set![lift_let_rules(), cse_bind()];
/// assert_eq!(rules.rules().len(), 6);
/// ```
#[macro_export]
macro_rules! rule_set {
    ($($rules:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut rules = Vec::new();
        $( rules.extend($crate::rewriting::rule::IntoRules::into_rules($rules)); )*
        $crate::rewriting::rule::RuleSet::new(rules)
    }};
}
