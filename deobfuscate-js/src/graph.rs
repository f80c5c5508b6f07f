use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use std::hash::Hash;

/// Directed graph over keys of type `K`. Nodes live in an arena and edges are stored as adjacency
/// lists of arena indices.
pub struct Graph<K> {
  keys: Vec<K>,
  index: HashMap<K, usize>,
  edges: Vec<Vec<usize>>,
}

impl<K: Copy + Eq + Hash> Graph<K> {
  pub fn new() -> Graph<K> {
    Graph {
      keys: Vec::new(),
      index: HashMap::new(),
      edges: Vec::new(),
    }
  }

  pub fn len(&self) -> usize {
    self.keys.len()
  }

  pub fn is_empty(&self) -> bool {
    self.keys.is_empty()
  }

  pub fn contains(&self, key: K) -> bool {
    self.index.contains_key(&key)
  }

  pub fn add_node(&mut self, key: K) -> usize {
    if let Some(i) = self.index.get(&key) {
      return *i;
    }
    let i = self.keys.len();
    self.keys.push(key);
    self.edges.push(Vec::new());
    self.index.insert(key, i);
    i
  }

  /// Adds `from -> to`, creating either node if missing. Duplicate edges are ignored.
  pub fn add_edge(&mut self, from: K, to: K) {
    let from = self.add_node(from);
    let to = self.add_node(to);
    if !self.edges[from].contains(&to) {
      self.edges[from].push(to);
    }
  }

  pub fn successors(&self, key: K) -> impl Iterator<Item = K> + '_ {
    self
      .index
      .get(&key)
      .into_iter()
      .flat_map(move |i| self.edges[*i].iter().map(|j| self.keys[*j]))
  }

  /// Every node that lies on a path into a cycle.
  ///
  /// A depth-first walk runs from every node while keeping the current branch. When an edge leads
  /// back into the branch, or into a node already known to reach a cycle, the whole branch and the
  /// edge's target are marked. Each node is expanded once.
  pub fn cyclic_nodes(&self) -> HashSet<K> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Color {
      White,
      // On the current branch.
      Grey,
      Black,
    }

    let n = self.keys.len();
    let mut color = vec![Color::White; n];
    let mut cyclic = vec![false; n];
    let mut branch: Vec<usize> = Vec::new();

    for start in 0..n {
      if color[start] != Color::White {
        continue;
      }
      // Each frame is a node and the position of the next edge to follow.
      let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
      color[start] = Color::Grey;
      branch.push(start);
      while let Some(frame) = stack.last_mut() {
        let node = frame.0;
        let edge = self.edges[node].get(frame.1).copied();
        frame.1 += 1;
        if let Some(target) = edge {
          match color[target] {
            Color::White => {
              color[target] = Color::Grey;
              branch.push(target);
              stack.push((target, 0));
            }
            Color::Grey => {
              for &b in &branch {
                cyclic[b] = true;
              }
            }
            Color::Black => {
              if cyclic[target] {
                for &b in &branch {
                  cyclic[b] = true;
                }
              }
            }
          }
        } else {
          color[node] = Color::Black;
          stack.pop();
          branch.pop();
        }
      }
    }

    (0..n)
      .filter(|i| cyclic[*i])
      .map(|i| self.keys[i])
      .collect()
  }
}

impl<K: Copy + Eq + Hash> Default for Graph<K> {
  fn default() -> Self {
    Graph::new()
  }
}

#[cfg(test)]
mod tests {
  use super::Graph;

  fn sorted(graph: &Graph<u32>) -> Vec<u32> {
    let mut out: Vec<u32> = graph.cyclic_nodes().into_iter().collect();
    out.sort();
    out
  }

  #[test]
  fn acyclic_graph_has_no_cyclic_nodes() {
    let mut g = Graph::new();
    g.add_edge(1, 2);
    g.add_edge(2, 3);
    g.add_edge(1, 3);
    g.add_node(4);
    assert!(sorted(&g).is_empty());
  }

  #[test]
  fn mutual_recursion() {
    let mut g = Graph::new();
    g.add_edge(1, 2);
    g.add_edge(2, 1);
    g.add_node(3);
    assert_eq!(sorted(&g), vec![1, 2]);
  }

  #[test]
  fn self_loop() {
    let mut g = Graph::new();
    g.add_edge(7, 7);
    g.add_edge(8, 9);
    assert_eq!(sorted(&g), vec![7]);
  }

  #[test]
  fn nodes_leading_into_a_cycle_are_marked() {
    // 1 -> 2 -> 3 -> 2, and 4 -> 3 is only discovered after 3 is finished.
    let mut g = Graph::new();
    g.add_edge(1, 2);
    g.add_edge(2, 3);
    g.add_edge(3, 2);
    g.add_edge(4, 3);
    g.add_edge(5, 6);
    assert_eq!(sorted(&g), vec![1, 2, 3, 4]);
  }

  #[test]
  fn duplicate_edges_are_ignored() {
    let mut g = Graph::new();
    g.add_edge(1, 2);
    g.add_edge(1, 2);
    assert_eq!(g.successors(1).collect::<Vec<_>>(), vec![2]);
    assert_eq!(g.len(), 2);
    assert!(g.contains(2));
    assert!(!g.contains(3));
  }
}
