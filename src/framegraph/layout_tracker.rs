
//! Per-image timeline of layout transitions across one frame.

use ash::vk;

use crate::framegraph::subresource::SubresourceMask;
use crate::framegraph::resource::active_range::ActiveRange;
use crate::framegraph::resource::usage::{ResourceUsage, CommandRange, CommandIndex};
use crate::error::VkErrorKind;

/// layouts considered interchangeable "read" states; a run of these that disagree collapses to
/// `GENERAL` rather than emitting an intra-run transition barrier.
fn is_read_layout(layout: vk::ImageLayout) -> bool {
    layout == vk::ImageLayout::TRANSFER_SRC_OPTIMAL
        || layout == vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
        || layout == vk::ImageLayout::GENERAL
}

#[derive(Debug, Clone)]
pub struct LayoutEntry {
    pub command_range: CommandRange,
    pub layout: vk::ImageLayout,
    pub subresources: SubresourceMask,
}

/// The ordered, per-image timeline of `(command-range, layout, subresource-range)` entries.
///
/// Invariant: for every command index in the frame and every subresource, at most one entry's
/// range contains that index and whose subresource-range contains the subresource; the list is
/// monotone in command-range.
#[derive(Debug, Clone)]
pub struct ImageLayoutTracker {
    resource_name: String,
    layer_count: u32,
    level_count: u32,
    entries: Vec<LayoutEntry>,
}

impl ImageLayoutTracker {

    pub fn new(resource_name: impl Into<String>, layer_count: u32, level_count: u32) -> ImageLayoutTracker {

        ImageLayoutTracker {
            resource_name: resource_name.into(),
            layer_count, level_count,
            entries: Vec::new(),
        }
    }

    fn full_mask(&self) -> SubresourceMask {
        SubresourceMask::full(self.layer_count, self.level_count)
    }

    fn range_to_mask(&self, range: &ActiveRange) -> SubresourceMask {
        match range {
            | ActiveRange::Texture(mask) => mask.clone(),
            | ActiveRange::FullResource => self.full_mask(),
            | _ => self.full_mask(),
        }
    }

    /// Reset the timeline for a new frame, then replay `usages` in declaration order.
    ///
    /// If `preserve_last_layout`, the frame-initial entry carries forward the subresource-layout
    /// mapping this image held at the end of the previous frame (persistent/history resources);
    /// otherwise the frame starts at `UNDEFINED` over `FullResource`.
    pub fn recompute_for_frame(&mut self, usages: &[ResourceUsage], preserve_last_layout: bool, is_depth_stencil: bool) {

        let carried_layout = if preserve_last_layout {
            self.entries.last().map(|e| e.layout).unwrap_or(vk::ImageLayout::UNDEFINED)
        } else {
            vk::ImageLayout::UNDEFINED
        };

        self.entries.clear();
        self.entries.push(LayoutEntry {
            command_range: CommandRange { start: -1, end: 0 },
            layout: carried_layout,
            subresources: self.full_mask(),
        });

        for usage in usages {

            let subresources = self.range_to_mask(&usage.active_range);

            let layout = match usage.usage_type.image_layout(is_depth_stencil) {
                | Some(layout) => layout,
                | None => self.layout_at_start_of(usage.command_range.start, &subresources),
            };

            self.entries.push(LayoutEntry {
                command_range: usage.command_range,
                layout,
                subresources,
            });
        }

        self.coalesce_read_runs();
    }

    fn layout_at_start_of(&self, index: CommandIndex, subresources: &SubresourceMask) -> vk::ImageLayout {

        for entry in self.entries.iter().rev() {
            if entry.command_range.contains(index) && entry.subresources.intersects(subresources) {
                return entry.layout;
            }
        }

        self.entries.last().map(|e| e.layout).unwrap_or(vk::ImageLayout::UNDEFINED)
    }

    /// Collapse a run of ≥2 consecutive read-layout entries with overlapping subresources and
    /// disagreeing layouts into one `GENERAL` run, removing the intra-run transition barrier.
    fn coalesce_read_runs(&mut self) {

        let mut i = 0;
        while i < self.entries.len() {

            if !is_read_layout(self.entries[i].layout) {
                i += 1;
                continue;
            }

            let mut j = i + 1;
            let mut disagreement = false;

            while j < self.entries.len()
                && is_read_layout(self.entries[j].layout)
                && self.entries[j].subresources.intersects(&self.entries[i].subresources) {

                if self.entries[j].layout != self.entries[i].layout {
                    disagreement = true;
                }
                j += 1;
            }

            if disagreement && j - i >= 2 {
                for entry in &mut self.entries[i..j] {
                    entry.layout = vk::ImageLayout::GENERAL;
                }
            }

            i = j.max(i + 1);
        }
    }

    /// Returns the layout held over `subresources` at frame start, plus the uncovered remainder
    /// (call repeatedly to cover a range with heterogeneous initial layouts).
    pub fn frame_initial_layout(&self, subresources: &SubresourceMask) -> (vk::ImageLayout, SubresourceMask, SubresourceMask) {

        let initial = self.entries.first().expect("layout tracker always carries a frame-initial entry");
        let covered = initial.subresources.intersection(subresources);
        let remaining = subresources.subtract(&covered);

        (initial.layout, covered, remaining)
    }

    /// The layout active at a specific command index over a subresource range. Panics (an
    /// invariant violation, not a recoverable error) if no entry covers the query.
    pub fn layout(&self, command_index: CommandIndex, subresources: &SubresourceMask) -> vk::ImageLayout {

        for entry in self.entries.iter().rev() {
            if entry.command_range.contains(command_index) && entry.subresources.intersects(subresources) {
                return entry.layout;
            }
        }

        let diagnostic = VkErrorKind::LayoutCoverage {
            resource: self.resource_name.clone(),
            command_index,
        };
        panic!("{}", diagnostic);
    }

    /// `initial` is the layout at the end of the previous usage command (or `UNDEFINED` if none);
    /// `final` is the layout at the start of the next usage (or `PRESENT_SRC_KHR` if this is a
    /// swapchain image with no later usage, else the last tracked layout).
    pub fn render_pass_layouts(
        &self,
        previous_cmd: Option<CommandIndex>,
        next_cmd: Option<CommandIndex>,
        subresources: &SubresourceMask,
        is_window_handle: bool,
    ) -> (vk::ImageLayout, vk::ImageLayout) {

        let initial = match previous_cmd {
            | Some(cmd) => self.layout(cmd, subresources),
            | None => vk::ImageLayout::UNDEFINED,
        };

        let final_layout = match next_cmd {
            | Some(cmd) => self.layout_at_start_of(cmd, subresources),
            | None if is_window_handle => vk::ImageLayout::PRESENT_SRC_KHR,
            | None => self.entries.last().map(|e| e.layout).unwrap_or(vk::ImageLayout::UNDEFINED),
        };

        (initial, final_layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framegraph::resource::{ResourceHandle, UsageType};

    fn usage(handle: ResourceHandle, usage_type: UsageType, start: i64, end: i64) -> ResourceUsage {
        ResourceUsage {
            resource: handle,
            usage_type,
            render_stages: vk::PipelineStageFlags::FRAGMENT_SHADER,
            command_range: CommandRange { start, end },
            active_range: ActiveRange::FullResource,
            owning_pass: 0,
            queue_family: 0,
            encoder_id: 0,
            render_pass_instance: None,
        }
    }

    #[test]
    fn layout_coverage_never_panics_for_declared_usages() {

        let handle = ResourceHandle::transient_texture(0);
        let usages = vec![
            usage(handle, UsageType::WriteOnlyRenderTarget, 0, 1),
            usage(handle, UsageType::Sampler, 1, 2),
        ];

        let mut tracker = ImageLayoutTracker::new("color-target", 1, 1);
        tracker.recompute_for_frame(&usages, false, false);

        let full = SubresourceMask::full(1, 1);
        for i in 0..2 {
            tracker.layout(i, &full);
        }
    }

    #[test]
    fn read_run_coalesces_to_general() {

        let handle = ResourceHandle::transient_texture(0);
        let usages = vec![
            usage(handle, UsageType::BlitSource, 0, 1),
            usage(handle, UsageType::Sampler, 1, 2),
            usage(handle, UsageType::BlitSource, 2, 3),
        ];

        let mut tracker = ImageLayoutTracker::new("history", 1, 1);
        tracker.recompute_for_frame(&usages, false, false);

        let full = SubresourceMask::full(1, 1);
        assert_eq!(tracker.layout(0, &full), vk::ImageLayout::GENERAL);
        assert_eq!(tracker.layout(1, &full), vk::ImageLayout::GENERAL);
        assert_eq!(tracker.layout(2, &full), vk::ImageLayout::GENERAL);
    }

    #[test]
    fn history_buffer_preserves_layout_across_frames() {

        let handle = ResourceHandle::persistent(crate::framegraph::resource::ResourceKind::Texture, 0, true);
        let mut tracker = ImageLayoutTracker::new("history", 1, 1);

        let frame_n = vec![usage(handle, UsageType::WriteOnlyRenderTarget, 0, 1)];
        tracker.recompute_for_frame(&frame_n, false, false);

        // simulate StoreResource forcing a GENERAL final layout for next frame's carry-forward.
        tracker.entries.last_mut().unwrap().layout = vk::ImageLayout::GENERAL;

        tracker.recompute_for_frame(&[], true, false);

        let full = SubresourceMask::full(1, 1);
        let (layout, covered, remaining) = tracker.frame_initial_layout(&full);
        assert_eq!(layout, vk::ImageLayout::GENERAL);
        assert!(!covered.is_empty());
        assert!(remaining.is_empty());
    }
}
