use super::generator::CodeGenerator;
use arch::{code, Code};
use std::fmt;

/// A piece of code whose size is known before it is emitted.
pub trait Action: fmt::Debug {
    /// Number of instructions `compile` generates
    fn cost(&self) -> usize;
    fn compile(&self, generator: &mut CodeGenerator);
}

impl Action for Code {
    fn cost(&self) -> usize {
        1
    }

    fn compile(&self, generator: &mut CodeGenerator) {
        generator.generate(self.clone());
    }
}

impl<A: Action + ?Sized> Action for Box<A> {
    fn cost(&self) -> usize {
        self.as_ref().cost()
    }

    fn compile(&self, generator: &mut CodeGenerator) {
        self.as_ref().compile(generator);
    }
}

#[derive(Debug, Default)]
pub struct CompositeAction {
    actions: Vec<Box<dyn Action>>,
}

impl CompositeAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    pub fn push(&mut self, action: Box<dyn Action>) {
        self.actions.push(action);
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Action> {
        self.actions.iter().map(|a| a.as_ref())
    }
}

impl Action for CompositeAction {
    fn cost(&self) -> usize {
        self.actions.iter().map(|a| a.cost()).sum()
    }

    fn compile(&self, generator: &mut CodeGenerator) {
        for action in &self.actions {
            action.compile(generator);
        }
    }
}

impl From<Vec<Box<dyn Action>>> for CompositeAction {
    fn from(actions: Vec<Box<dyn Action>>) -> Self {
        Self { actions }
    }
}

/// Box every action and chain them into one [`CompositeAction`].
///
/// ```ignore
/// actions![value, code!(PushA)]
/// ```
#[macro_export]
macro_rules! actions {
    ($($action:expr),* $(,)?) => {{
        let actions: Vec<Box<dyn $crate::backend::actions::Action>> =
            vec![$(Box::new($action) as Box<dyn $crate::backend::actions::Action>),*];
        $crate::backend::actions::CompositeAction::from(actions)
    }};
}

/// A = 1 when the flag is set, 0 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct FlagToRegister;

impl Action for FlagToRegister {
    fn cost(&self) -> usize {
        3
    }

    fn compile(&self, generator: &mut CodeGenerator) {
        generator.generate(code!(LdaConstant, val = 1));
        // skips the 2 byte `LDA #0`
        generator.generate(code!(BranchFlag, offset = 2));
        generator.generate(code!(LdaConstant, val = 0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_cost() {
        let action = actions![
            code!(PushConstant, val = 5),
            actions![code!(PopA), FlagToRegister],
        ];
        assert_eq!(action.cost(), 5);

        let mut generator = CodeGenerator::new("main()");
        generator.emit(&action);
        let (codes, _) = generator.finish();
        assert_eq!(codes.len(), action.cost());
    }
}
