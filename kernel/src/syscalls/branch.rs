//! Fork branch scan
//!
//! After a `FORK` the trace is split into the child's instruction stream and
//! the point where the parent carries on. The scan is one forward pass from
//! the `FORK` itself, driven by two flags:
//!
//! - `skip`: true while outside the child's view of the trace. Starts true,
//!   cleared by the first `IF_CHILD` and by an `ENDIF` seen while skipping,
//!   set again by every `IF_PARENT`
//! - `exec_captured`: set once an `EXEC` inside the child block has been
//!   taken into the child stream; that `EXEC` also sets `skip`
//!
//! Every line seen while `skip` is clear goes into the child stream. Each
//! `IF_PARENT` records the parent's resume position, and the pass stops at
//! the first `IF_PARENT` reached after an `EXEC` was captured. Without a
//! captured `EXEC` the pass runs to the end of the trace, so the parent
//! resumes at the *last* `IF_PARENT` it saw.

use super::directive::{Directive, DirectiveKind};

/// Result of splitting a trace at a `FORK`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchSplit {
    /// Instruction stream of the child
    pub child: Vec<Directive>,
    /// Index of the `IF_PARENT` the parent resumes after, if one was found
    pub parent_resume: Option<usize>,
    /// Whether the child stream ends with a captured `EXEC`
    pub exec_captured: bool,
}

/// Split `trace` at the `FORK` found at `fork_index`
pub fn split_fork_branches(trace: &[Directive], fork_index: usize) -> BranchSplit {
    let mut split = BranchSplit::default();
    let mut skip = true;

    for (index, directive) in trace.iter().enumerate().skip(fork_index) {
        match directive.kind {
            DirectiveKind::IfChild if skip => {
                skip = false;
                continue;
            }
            DirectiveKind::IfParent => {
                skip = true;
                split.parent_resume = Some(index);
                if split.exec_captured {
                    break;
                }
            }
            DirectiveKind::EndIf if skip => {
                skip = false;
                continue;
            }
            DirectiveKind::Exec { .. } if !skip => {
                skip = true;
                split.child.push(directive.clone());
                split.exec_captured = true;
            }
            _ => {}
        }
        if !skip {
            split.child.push(directive.clone());
        }
    }

    split
}
