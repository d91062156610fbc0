use serde::Serialize;

/// Interaction penalty between two edges placed on lanes `level_a` and
/// `level_b`.
///
/// Implementations must be symmetric: `pair_score(a, b, x, y, _)` equals
/// `pair_score(b, a, y, x, _)`. Two edges cross when `pair_score(a, b, 1, 1)`
/// is infinite. `levels` holds the full assignment when one exists and is
/// empty while components are being computed.
pub trait PairScore {
    fn pair_score(&self, a: usize, b: usize, level_a: u32, level_b: u32, levels: &[u32]) -> f64;
}

impl<F> PairScore for F
where
    F: Fn(usize, usize, u32, u32, &[u32]) -> f64,
{
    fn pair_score(&self, a: usize, b: usize, level_a: u32, level_b: u32, levels: &[u32]) -> f64 {
        self(a, b, level_a, level_b, levels)
    }
}

/// A horizontal child line below a childhub: the hub connector rises from
/// `rise`, one connector drops to each child at `drops`.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalLine {
    pub left: f64,
    pub right: f64,
    pub rise: Option<f64>,
    pub drops: Vec<f64>,
    /// Set for a lone child at the edge of its rank whose hub sits further
    /// out; such a line reads best on the lane nearest the hubs.
    pub needs_topmost: bool,
}

impl HorizontalLine {
    pub fn new(rise: Option<f64>, drops: Vec<f64>) -> Self {
        let xs = || rise.iter().chain(drops.iter()).copied();
        let left = xs().fold(f64::INFINITY, f64::min);
        let right = xs().fold(f64::NEG_INFINITY, f64::max);
        let (left, right) = if left <= right { (left, right) } else { (0.0, 0.0) };
        Self {
            left,
            right,
            rise,
            drops,
            needs_topmost: false,
        }
    }

    pub fn topmost(mut self) -> Self {
        self.needs_topmost = true;
        self
    }

    pub fn overlaps(&self, other: &HorizontalLine) -> bool {
        self.left <= other.right && other.left <= self.right
    }

    fn spans(&self, x: f64) -> bool {
        self.left <= x && x <= self.right
    }
}

/// Scores child lines sharing one gap between ranks. Level 1 is the lane
/// nearest the childhubs; larger levels sit lower.
#[derive(Debug, Clone)]
pub struct ChildLineScore {
    pub lines: Vec<HorizontalLine>,
    pub crossing_penalty: f64,
    /// Added when a line that wants the top lane sits under another.
    pub topmost_penalty: f64,
}

impl ChildLineScore {
    pub fn new(lines: Vec<HorizontalLine>) -> Self {
        Self {
            lines,
            crossing_penalty: 1.0,
            topmost_penalty: 0.1,
        }
    }

    /// Drops of `upper` through `lower` plus the rise of `lower` through `upper`.
    fn stacking_penalty(&self, upper: &HorizontalLine, lower: &HorizontalLine) -> f64 {
        let drops = upper.drops.iter().filter(|x| lower.spans(**x)).count();
        let rise = lower.rise.filter(|x| upper.spans(*x)).map_or(0, |_| 1);
        let mut penalty = (drops + rise) as f64 * self.crossing_penalty;
        if lower.needs_topmost {
            penalty += self.topmost_penalty;
        }
        penalty
    }
}

impl PairScore for ChildLineScore {
    fn pair_score(&self, a: usize, b: usize, level_a: u32, level_b: u32, _levels: &[u32]) -> f64 {
        let (Some(line_a), Some(line_b)) = (self.lines.get(a), self.lines.get(b)) else {
            return 0.0;
        };
        if !line_a.overlaps(line_b) {
            return 0.0;
        }
        match level_a.cmp(&level_b) {
            std::cmp::Ordering::Equal => f64::INFINITY,
            std::cmp::Ordering::Less => self.stacking_penalty(line_a, line_b),
            std::cmp::Ordering::Greater => self.stacking_penalty(line_b, line_a),
        }
    }
}

/// Which side of its upper vertex a partner line leaves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// A line from a partner (or the virtual vertex standing in for one) down to
/// its relationship on the next rank. It leaves the partner at `top`, runs
/// along its lane and drops into the relationship at `down`.
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerLine {
    /// Index of the upper vertex among the lines' sources; lines sharing it
    /// also share `side` ordering through `attach`.
    pub source: usize,
    pub side: Side,
    /// 0 for the relationship nearest the source on this side.
    pub attach: u32,
    pub top: f64,
    pub down: f64,
    pub left: f64,
    pub right: f64,
    /// The line of the other partner into the same relationship.
    pub complement: Option<usize>,
}

impl PartnerLine {
    pub fn new(source: usize, side: Side, attach: u32, top: f64, down: f64) -> Self {
        Self {
            source,
            side,
            attach,
            top,
            down,
            left: top.min(down),
            right: top.max(down),
            complement: None,
        }
    }

    fn overlaps(&self, other: &PartnerLine) -> bool {
        self.left < other.right && other.left < self.right
    }

    fn passes(&self, x: f64) -> bool {
        self.left < x && x < self.right
    }
}

/// Scores partner lines sharing the gap above a relationship rank. Level 1
/// is the lane nearest the relationships; larger levels sit higher.
#[derive(Debug, Clone)]
pub struct PartnerLineScore {
    pub lines: Vec<PartnerLine>,
    pub crossing_penalty: f64,
    /// Taken off a crossing when both partners of a relationship run above
    /// the crossed line, since they drop into it along one connector.
    pub shared_drop_discount: f64,
}

impl PartnerLineScore {
    /// `relationships[i]` identifies the relationship line `i` ends in; two
    /// lines ending in the same one become complements.
    pub fn new(mut lines: Vec<PartnerLine>, relationships: &[usize]) -> Self {
        for a in 0..lines.len() {
            let Some(relationship) = relationships.get(a) else {
                break;
            };
            if lines[a].complement.is_some() {
                continue;
            }
            let other = (a + 1..lines.len()).find(|b| {
                relationships.get(*b) == Some(relationship) && lines[*b].complement.is_none()
            });
            if let Some(b) = other {
                lines[a].complement = Some(b);
                lines[b].complement = Some(a);
            }
        }
        Self {
            lines,
            crossing_penalty: 1.0,
            shared_drop_discount: 0.4,
        }
    }

    /// Drop of `upper` through `lower` plus the connector of `lower` up
    /// through `upper`.
    fn stacking_penalty(
        &self,
        upper: &PartnerLine,
        lower: &PartnerLine,
        lower_level: u32,
        levels: &[u32],
    ) -> f64 {
        if upper.source == lower.source && upper.side == lower.side && upper.attach < lower.attach {
            // lines leaving one vertex on one side keep their nesting
            return f64::INFINITY;
        }
        let mut penalty = 0.0;
        if lower.passes(upper.down) {
            penalty += self.crossing_penalty;
            let shared = upper
                .complement
                .is_some_and(|c| levels.get(c).is_none_or(|level| *level > lower_level));
            if shared {
                penalty -= self.shared_drop_discount;
            }
        }
        if upper.passes(lower.top) {
            penalty += self.crossing_penalty;
        }
        penalty
    }
}

impl PairScore for PartnerLineScore {
    fn pair_score(&self, a: usize, b: usize, level_a: u32, level_b: u32, levels: &[u32]) -> f64 {
        let (Some(line_a), Some(line_b)) = (self.lines.get(a), self.lines.get(b)) else {
            return 0.0;
        };
        if !line_a.overlaps(line_b) {
            return 0.0;
        }
        match level_a.cmp(&level_b) {
            std::cmp::Ordering::Equal => f64::INFINITY,
            std::cmp::Ordering::Greater => self.stacking_penalty(line_a, line_b, level_b, levels),
            std::cmp::Ordering::Less => self.stacking_penalty(line_b, line_a, level_a, levels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_lines_cannot_share_a_lane() {
        let score = ChildLineScore::new(vec![
            HorizontalLine::new(Some(5.0), vec![0.0, 10.0]),
            HorizontalLine::new(Some(12.0), vec![8.0, 16.0]),
            HorizontalLine::new(Some(30.0), vec![25.0, 35.0]),
        ]);
        assert_eq!(score.pair_score(0, 1, 1, 1, &[]), f64::INFINITY);
        assert_eq!(score.pair_score(0, 2, 1, 1, &[]), 0.0);
        assert_eq!(score.pair_score(1, 2, 3, 1, &[]), 0.0);
    }

    #[test]
    fn connectors_through_other_lines_are_penalised() {
        let score = ChildLineScore::new(vec![
            HorizontalLine::new(Some(5.0), vec![0.0, 10.0]),
            HorizontalLine::new(Some(9.0), vec![8.0, 16.0]),
        ]);
        // line 0 on top: its drop at 10 and line 1's rise at 9 cross
        assert_eq!(score.pair_score(0, 1, 1, 2, &[]), 2.0);
        // line 1 on top: only its drop at 8 crosses line 0
        assert_eq!(score.pair_score(0, 1, 2, 1, &[]), 1.0);
        assert_eq!(
            score.pair_score(1, 0, 1, 2, &[]),
            score.pair_score(0, 1, 2, 1, &[])
        );
        assert_eq!(score.pair_score(0, 1, 1, 5, &[]), score.pair_score(0, 1, 1, 2, &[]));
    }

    #[test]
    fn lone_edge_child_prefers_the_top_lane() {
        let score = ChildLineScore::new(vec![
            HorizontalLine::new(Some(20.0), vec![0.0]).topmost(),
            HorizontalLine::new(Some(25.0), vec![18.0, 30.0]),
        ]);
        assert_eq!(score.pair_score(0, 1, 1, 2, &[]), 0.0);
        let under = score.pair_score(0, 1, 2, 1, &[]);
        assert!((under - 2.1).abs() < 1e-12);
    }

    #[test]
    fn partner_lines_from_one_vertex_keep_their_nesting() {
        let score = PartnerLineScore::new(
            vec![
                PartnerLine::new(0, Side::Right, 0, 0.0, 10.0),
                PartnerLine::new(0, Side::Right, 1, 0.0, 20.0),
                PartnerLine::new(1, Side::Left, 0, 40.0, 30.0),
            ],
            &[0, 1, 2],
        );
        assert_eq!(score.pair_score(0, 1, 1, 2, &[]), 0.0);
        assert!(score.pair_score(0, 1, 2, 1, &[]).is_infinite());
        assert!(score.pair_score(0, 1, 1, 1, &[]).is_infinite());
        assert_eq!(score.pair_score(1, 2, 1, 1, &[]), 0.0);
    }

    #[test]
    fn shared_relationship_drop_is_discounted() {
        let score = PartnerLineScore::new(
            vec![
                PartnerLine::new(0, Side::Right, 0, 0.0, 15.0),
                PartnerLine::new(1, Side::Left, 0, 30.0, 15.0),
                PartnerLine::new(2, Side::Left, 0, 20.0, 5.0),
            ],
            &[7, 7, 8],
        );
        assert_eq!(score.lines[0].complement, Some(1));
        assert_eq!(score.lines[2].complement, None);

        // without an assignment the other partner is assumed to run above
        let discounted = score.pair_score(0, 2, 2, 1, &[]);
        assert!((discounted - 0.6).abs() < 1e-12);
        assert_eq!(score.pair_score(0, 2, 2, 1, &[2, 1, 1]), 1.0);
        let both_above = score.pair_score(0, 2, 2, 1, &[2, 3, 1]);
        assert!((both_above - 0.6).abs() < 1e-12);
        assert_eq!(
            score.pair_score(2, 0, 1, 2, &[2, 3, 1]),
            score.pair_score(0, 2, 2, 1, &[2, 3, 1])
        );

        // line 2 on top drops at 5 through line 0
        assert_eq!(score.pair_score(0, 2, 1, 2, &[]), 1.0);
    }

    #[test]
    fn closures_are_pair_scores() {
        let score = |a: usize, b: usize, la: u32, lb: u32, _: &[u32]| -> f64 {
            if la == lb { f64::INFINITY } else { (a + b) as f64 }
        };
        assert_eq!(score.pair_score(1, 2, 1, 2, &[]), 3.0);
        assert!(score.pair_score(1, 2, 1, 1, &[]).is_infinite());
    }
}
