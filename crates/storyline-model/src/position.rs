//! Absolute position calculator.
//!
//! Positions are computed along an explicit ancestor chain (document root
//! first) rather than parent links, so content reached through a `ref-clip`
//! or `mc-clip` resource is placed relative to the clip that uses it.
//!
//! Walking the chain from the timeline origin down:
//! - the origin (first `sequence`/`multicam`, or first element carrying
//!   `tcStart`) seeds the total with its `tcStart`, or zero
//! - an `offset` adds `offset - local start of the parent`, where the local
//!   start is the parent's `start`, else its `tcStart`, else zero
//! - markers and keywords add `start - local start of the parent`
//! - an element without `offset` but with its own `start`/`tcStart` aligns
//!   its local timeline with the parent's and adds the difference
//! - everything else (primary spines, angles, auditions) is transparent
//!
//! Each delta is scaled by the cumulative conform factor of the timeline it
//! is expressed in: the parent's for offsets and annotation starts, the
//! element's own for its `start`.

use storyline_core::{scaling_factor, Fraction, Rate, Result, TimeRange, TimeValue};

use crate::attributes::{TcFormat, TimingAttributes};
use crate::kind::{classify, ClipKind, ContainerKind, ElementKind};
use crate::node::XmlNode;
use crate::resources::ResourceIndex;

/// Where an element sits in absolute project time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    /// Absolute start, `None` without a position-bearing ancestor.
    pub start: Option<Fraction>,
    /// Duration converted to project time.
    pub duration: Option<Fraction>,
    /// Rate governing the element itself.
    pub rate: Option<Rate>,
    /// Rate of the timeline origin, for display timecode.
    pub timeline_rate: Option<Rate>,
    /// Audio extent of a split edit (`audioStart`/`audioDuration`), when it
    /// differs from the picture.
    pub audio: Option<TimeRange>,
}

impl Placement {
    /// Absolute interval; elements without a duration are empty ranges.
    pub fn range(&self) -> Option<TimeRange> {
        Some(TimeRange::new(
            self.start?,
            self.duration.unwrap_or(Fraction::ZERO),
        ))
    }
}

/// The frame rate an element declares itself, ignoring its ancestors.
pub fn governing_rate<N: XmlNode>(node: N, resources: &ResourceIndex<N>) -> Result<Option<Rate>> {
    declared_rate(node, &TimingAttributes::read(node)?, resources)
}

fn declared_rate<N: XmlNode>(
    node: N,
    timing: &TimingAttributes,
    resources: &ResourceIndex<N>,
) -> Result<Option<Rate>> {
    let format_attr = node.attribute("format");
    let own = match classify(node) {
        Some(ElementKind::Story(_)) if format_attr.is_some() => {
            format_attr.map(|id| resources.rate_of_format_ref(id)).transpose()?.flatten()
        }
        Some(kind) => match kind.clip_kind() {
            Some(ClipKind::AssetClip) => match node.attribute("ref") {
                Some(id) => resources.format_of(resources.asset(id)?)?,
                None => None,
            },
            Some(ClipKind::RefClip | ClipKind::McClip) => match node.attribute("ref") {
                Some(id) => resources.format_of(resources.media(id)?)?,
                None => None,
            },
            _ => None,
        },
        None => None,
    };

    let drop_frame = timing.tc_format == Some(TcFormat::DropFrame);
    Ok(own.map(|rate| rate.with_drop_frame(drop_frame)))
}

/// Per-node facts along a chain, gathered once per query.
struct Chain<N: XmlNode> {
    nodes: Vec<N>,
    kinds: Vec<Option<ElementKind>>,
    timings: Vec<TimingAttributes>,
    /// Effective rate (own, else inherited from the parent).
    rates: Vec<Option<Rate>>,
    /// Conform factor from each node's timeline into its parent's; 1 at the root.
    steps: Vec<Fraction>,
}

impl<N: XmlNode> Chain<N> {
    fn new(element: N, ancestors: &[N], resources: &ResourceIndex<N>) -> Result<Self> {
        let nodes: Vec<N> = ancestors.iter().copied().chain(std::iter::once(element)).collect();
        let mut kinds = Vec::with_capacity(nodes.len());
        let mut timings = Vec::with_capacity(nodes.len());
        let mut rates: Vec<Option<Rate>> = Vec::with_capacity(nodes.len());
        let mut steps = Vec::with_capacity(nodes.len());

        for (i, &node) in nodes.iter().enumerate() {
            let timing = TimingAttributes::read(node)?;
            let parent_rate = if i == 0 { None } else { rates[i - 1] };
            let rate = declared_rate(node, &timing, resources)?.or(parent_rate);
            kinds.push(classify(node));
            timings.push(timing);

            let step = match (rate, parent_rate) {
                (Some(own), Some(parent)) if own != parent => scaling_factor(&own, &parent)?,
                _ => Fraction::ONE,
            };
            rates.push(rate);
            steps.push(step);
        }

        Ok(Self {
            nodes,
            kinds,
            timings,
            rates,
            steps,
        })
    }

    fn last(&self) -> usize {
        self.nodes.len() - 1
    }

    /// First position-bearing node.
    fn origin(&self) -> Option<usize> {
        (0..self.nodes.len()).find(|&i| {
            matches!(
                self.kinds[i].and_then(ElementKind::container_kind),
                Some(ContainerKind::Sequence | ContainerKind::Multicam)
            ) || self.timings[i].tc_start.is_some()
        })
    }

    fn resolve(&self, value: TimeValue, rate_index: usize) -> Result<Fraction> {
        value.resolve(self.rates[rate_index].as_ref())
    }

    fn is_point_annotation(&self, i: usize) -> bool {
        self.kinds[i].is_some_and(ElementKind::is_point_annotation)
    }

    /// Audition picks carry offsets in the audition's parent timeline.
    fn is_audition(&self, i: usize) -> bool {
        self.kinds[i].and_then(ElementKind::clip_kind) == Some(ClipKind::Audition)
    }

    /// Value seeding the running total at the origin.
    fn base(&self, origin: usize) -> Result<Fraction> {
        match self.timings[origin].tc_start {
            Some(tc_start) => self.resolve(tc_start, origin),
            None => Ok(Fraction::ZERO),
        }
    }

    /// The element's own local start: `start`, else `tcStart`.
    fn own_start(&self, i: usize) -> Result<Option<Fraction>> {
        let timing = &self.timings[i];
        timing
            .start
            .or(timing.tc_start)
            .map(|value| self.resolve(value, i))
            .transpose()
    }

    /// Product of conform steps over `from..=to`.
    fn factor(&self, from: usize, to: usize) -> Fraction {
        if from > to {
            return Fraction::ONE;
        }
        self.steps[from..=to]
            .iter()
            .fold(Fraction::ONE, |acc, &step| acc * step)
    }

    /// Contribution of node `i` given the parent's local start. Returns the
    /// scaled delta and the local start node `i` establishes, or `None`
    /// when the node is transparent.
    fn contribution(
        &self,
        i: usize,
        origin: usize,
        parent_start: Fraction,
    ) -> Result<Option<(Fraction, Fraction)>> {
        if self.is_audition(i) {
            return Ok(None);
        }
        let parent_factor = self.factor(origin + 1, i - 1);

        if self.is_point_annotation(i) {
            let at = match self.timings[i].start {
                Some(start) => self.resolve(start, i - 1)?,
                None => Fraction::ZERO,
            };
            return Ok(Some(((at - parent_start) * parent_factor, at)));
        }

        if let Some(offset) = self.timings[i].offset {
            let offset = self.resolve(offset, i - 1)?;
            let local = self.own_start(i)?.unwrap_or(Fraction::ZERO);
            return Ok(Some(((offset - parent_start) * parent_factor, local)));
        }

        if let Some(own) = self.own_start(i)? {
            let own_factor = parent_factor * self.steps[i];
            return Ok(Some(((own - parent_start) * own_factor, own)));
        }

        Ok(None)
    }

    /// Local start in effect at node `j`, found by scanning towards the
    /// origin for the nearest non-transparent node.
    fn local_start_at(&self, j: usize, origin: usize) -> Result<Fraction> {
        for k in (origin + 1..=j).rev() {
            if self.is_audition(k) {
                continue;
            }
            if self.is_point_annotation(k) {
                return match self.timings[k].start {
                    Some(start) => self.resolve(start, k - 1),
                    None => Ok(Fraction::ZERO),
                };
            }
            if self.timings[k].offset.is_some() {
                return Ok(self.own_start(k)?.unwrap_or(Fraction::ZERO));
            }
            if let Some(own) = self.own_start(k)? {
                return Ok(own);
            }
        }
        self.base(origin)
    }

    fn start_top_down(&self) -> Result<Option<Fraction>> {
        let Some(origin) = self.origin() else {
            return Ok(None);
        };

        let mut total = self.base(origin)?;
        let mut local_start = total;
        for i in origin + 1..=self.last() {
            if let Some((delta, local)) = self.contribution(i, origin, local_start)? {
                total += delta;
                local_start = local;
            }
        }
        Ok(Some(total))
    }

    fn start_bottom_up(&self) -> Result<Option<Fraction>> {
        let Some(origin) = self.origin() else {
            return Ok(None);
        };

        let mut relative = Fraction::ZERO;
        for i in (origin + 1..=self.last()).rev() {
            let parent_start = self.local_start_at(i - 1, origin)?;
            if let Some((delta, _)) = self.contribution(i, origin, parent_start)? {
                relative += delta;
            }
        }
        Ok(Some(self.base(origin)? + relative))
    }

    /// Audio extent of the last node from its `audioStart`/`audioDuration`,
    /// both expressed in the node's own timeline like `start`/`duration`.
    fn audio(&self, start: Option<Fraction>) -> Result<Option<TimeRange>> {
        let last = self.last();
        let timing = &self.timings[last];
        if timing.audio_start.is_none() && timing.audio_duration.is_none() {
            return Ok(None);
        }
        let Some(start) = start else {
            return Ok(None);
        };
        let from = self.origin().map_or(1, |origin| origin + 1);
        let factor = self.factor(from, last);

        let local_start = self.own_start(last)?.unwrap_or(Fraction::ZERO);
        let audio_start = match timing.audio_start {
            Some(value) => start + (self.resolve(value, last)? - local_start) * factor,
            None => start,
        };
        let audio_duration = match timing.audio_duration.or(timing.duration) {
            Some(value) => self.resolve(value, last)? * factor,
            None => Fraction::ZERO,
        };
        Ok(Some(TimeRange::new(audio_start, audio_duration)))
    }

    fn duration(&self) -> Result<Option<Fraction>> {
        let last = self.last();
        let Some(duration) = self.timings[last].duration else {
            return Ok(None);
        };
        let from = self.origin().map_or(1, |origin| origin + 1);
        Ok(Some(self.resolve(duration, last)? * self.factor(from, last)))
    }
}

/// Absolute start of `element`, walking its `ancestors` (document root
/// first) from the timeline origin down.
pub fn absolute_start<N: XmlNode>(
    element: N,
    ancestors: &[N],
    resources: &ResourceIndex<N>,
) -> Result<Option<Fraction>> {
    Chain::new(element, ancestors, resources)?.start_top_down()
}

/// Same value as [`absolute_start`], accumulated from the element upwards.
pub fn absolute_start_bottom_up<N: XmlNode>(
    element: N,
    ancestors: &[N],
    resources: &ResourceIndex<N>,
) -> Result<Option<Fraction>> {
    Chain::new(element, ancestors, resources)?.start_bottom_up()
}

/// Duration of `element` in project time.
pub fn absolute_duration<N: XmlNode>(
    element: N,
    ancestors: &[N],
    resources: &ResourceIndex<N>,
) -> Result<Option<Fraction>> {
    Chain::new(element, ancestors, resources)?.duration()
}

/// Absolute interval of `element`; `None` without a timeline origin.
pub fn absolute_range<N: XmlNode>(
    element: N,
    ancestors: &[N],
    resources: &ResourceIndex<N>,
) -> Result<Option<TimeRange>> {
    Ok(place(element, ancestors, resources)?.range())
}

/// Start, duration and rates of `element` in one walk.
pub fn place<N: XmlNode>(
    element: N,
    ancestors: &[N],
    resources: &ResourceIndex<N>,
) -> Result<Placement> {
    let chain = Chain::new(element, ancestors, resources)?;
    let start = chain.start_top_down()?;
    Ok(Placement {
        start,
        duration: chain.duration()?,
        rate: chain.rates[chain.last()],
        timeline_rate: chain.origin().and_then(|origin| chain.rates[origin]),
        audio: chain.audio(start)?,
    })
}
