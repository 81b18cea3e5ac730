use crate::grammer::ast::{AstNode, FunctionNode};

/// Lift every lambda out of the program. Each lambda becomes a top level
/// function named `lambda-<function>-<n>` and is replaced by a reference to it.
pub fn extract_lambdas(nodes: &[AstNode]) -> Vec<AstNode> {
    let mut result = Vec::new();
    for node in nodes {
        let AstNode::Function(function) = node else {
            result.push(node.clone());
            continue;
        };
        let mut lifted = Vec::new();
        let body = function
            .body
            .iter()
            .map(|statement| lift(statement, &function.name, &mut lifted))
            .collect();
        result.push(AstNode::Function(FunctionNode {
            body,
            ..function.clone()
        }));
        result.extend(lifted.into_iter().map(AstNode::Function));
    }
    result
}

fn lift(node: &AstNode, owner: &str, lifted: &mut Vec<FunctionNode>) -> AstNode {
    node.replace(&mut |n| {
        let AstNode::Lambda(lambda) = n else {
            return None;
        };
        let name = format!("lambda-{}-{}", owner, lifted.len());
        // Lambdas inside the lambda belong to the same owner
        let body = lambda.body.iter().map(|s| lift(s, owner, lifted)).collect();
        lifted.push(FunctionNode {
            name: name.clone(),
            body,
            ..lambda.clone()
        });
        Some(AstNode::FunctionReference(name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammer::ast::FunctionKind;

    fn function(name: &str, body: Vec<AstNode>) -> FunctionNode {
        FunctionNode {
            name: name.into(),
            kind: FunctionKind::Normal,
            params: vec![],
            ret: None,
            body,
        }
    }

    #[test]
    fn lift_lambda() {
        let lambda = AstNode::Lambda(function(
            "",
            vec![AstNode::call("print", FunctionKind::Normal, vec![AstNode::Constant(1)])],
        ));
        let program = vec![AstNode::Function(function(
            "main",
            vec![AstNode::assign(AstNode::ident("f"), lambda)],
        ))];

        let result = extract_lambdas(&program);
        assert_eq!(result.len(), 2);
        assert_eq!(
            result[0],
            AstNode::Function(function(
                "main",
                vec![AstNode::assign(
                    AstNode::ident("f"),
                    AstNode::FunctionReference("lambda-main-0".into())
                )],
            ))
        );
        let AstNode::Function(lifted) = &result[1] else {
            panic!("expected a function");
        };
        assert_eq!(lifted.name, "lambda-main-0");
        assert_eq!(lifted.body.len(), 1);
    }
}
