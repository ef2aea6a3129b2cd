use std::{collections::VecDeque, fmt};

use crate::{balance::RankTree, Dir};

/// Writes `tree` as a Graphviz digraph, one `rank=same` row per depth.
///
/// Nodes are labelled `key:parity`. Missing children are drawn as points so the shape of the tree
/// stays visible.
pub(crate) fn dotgraph<S, L, W>(
    tree: &S,
    name: &str,
    label: impl Fn(S::Node) -> L,
    mut w: W,
) -> fmt::Result
where
    S: RankTree + ?Sized,
    L: fmt::Debug,
    W: fmt::Write,
{
    let root = tree.root();
    if root == S::NIL {
        return write!(w, "digraph \"graph-{name}\" {{}}");
    }

    enum Item<N> {
        Node(N),
        Missing(u32),
    }

    let mut queue = VecDeque::new();
    queue.push_back(Item::Node(root));

    write!(
        w,
        "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
    )?;

    let mut missing = 0;
    let mut links = String::new();

    while !queue.is_empty() {
        use fmt::Write;

        write!(w, "{{rank=same; ")?;

        for _ in 0..queue.len() {
            let node = match queue.pop_front() {
                Some(Item::Node(node)) => node,
                Some(Item::Missing(id)) => {
                    write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                    continue;
                }
                None => break,
            };

            let parity = tree.parity(node) as u8;
            write!(
                w,
                "\"graph{name}-{node:?}\" [label=\"{:?}:{parity}\"]; ",
                label(node)
            )?;

            for dir in [Dir::Left, Dir::Right] {
                let child = tree.child(node, dir);

                if child == S::NIL {
                    queue.push_back(Item::Missing(missing));
                    writeln!(
                        links,
                        "\"graph{name}-{node:?}\" -> \"graph{name}-missing{missing}\";"
                    )?;
                    missing += 1;
                } else {
                    queue.push_back(Item::Node(child));
                    writeln!(
                        links,
                        "\"graph{name}-{node:?}\" -> \"graph{name}-{child:?}\";"
                    )?;
                }
            }
        }

        writeln!(w, "}}")?;
    }

    w.write_str(&links)?;

    w.write_str(" }\n}")
}
