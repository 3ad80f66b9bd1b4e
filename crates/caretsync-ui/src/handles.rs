//! Owns the three drag handles of the focused field and keeps them in step
//! with the selection.

use caretsync_core::{EditResult, Size, Vec2};
use web_time::Duration;

use crate::field::{FieldGeometry, FieldId};
use crate::handle::{DragHandle, HandleId, HandleRole};
use crate::layout::{TextLayoutProvider, handle_anchor, resolve_index};
use crate::selection::{ChangeOrigin, Selection, SelectionModel};

/// Extra room around the viewport, as a scale factor, before a handle counts
/// as scrolled out of view.
pub const VISIBILITY_MARGIN_SCALE: f32 = 1.1;

/// What a handle release amounted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleRelease {
    /// The caret handle was let go without moving the caret.
    Tap,
    Moved,
    /// The handle wasn't held.
    Ignored,
}

#[derive(Debug)]
pub struct HandleCoordinator {
    start: DragHandle,
    end: DragHandle,
    caret: DragHandle,
    owner: Option<FieldId>,
    enabled: bool,
    caret_suppressed: bool,
    caret_at_press: Option<usize>,
    last_index: Option<usize>,
}

impl Default for HandleCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleCoordinator {
    pub fn new() -> Self {
        Self {
            start: DragHandle::new(HandleId::Start),
            end: DragHandle::new(HandleId::End),
            caret: DragHandle::new(HandleId::Caret),
            owner: None,
            enabled: true,
            caret_suppressed: false,
            caret_at_press: None,
            last_index: None,
        }
    }

    pub fn owner(&self) -> Option<FieldId> {
        self.owner
    }

    /// Attaches the handles to `field`, dropping all state from the previous
    /// owner.
    pub fn bind(&mut self, field: FieldId) {
        if self.owner == Some(field) {
            return;
        }
        log::debug!("handles bound to {field:?} (was {:?})", self.owner);
        self.hide_all();
        self.owner = Some(field);
        self.caret_suppressed = false;
    }

    pub fn unbind(&mut self) {
        self.hide_all();
        self.owner = None;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.hide_all();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Hides the caret handle until the next tap clears it.
    pub fn set_caret_suppressed(&mut self, suppressed: bool) {
        self.caret_suppressed = suppressed;
        if suppressed {
            self.caret.hide();
        }
    }

    pub fn is_caret_suppressed(&self) -> bool {
        self.caret_suppressed
    }

    pub fn handle(&self, id: HandleId) -> &DragHandle {
        match id {
            HandleId::Start => &self.start,
            HandleId::End => &self.end,
            HandleId::Caret => &self.caret,
        }
    }

    fn handle_mut(&mut self, id: HandleId) -> &mut DragHandle {
        match id {
            HandleId::Start => &mut self.start,
            HandleId::End => &mut self.end,
            HandleId::Caret => &mut self.caret,
        }
    }

    /// Handle currently held, if any.
    pub fn held(&self) -> Option<HandleId> {
        HandleId::ALL.into_iter().find(|id| self.handle(*id).is_held())
    }

    pub fn resize(&mut self, side: f32) {
        for id in HandleId::ALL {
            self.handle_mut(id).set_size(Size::square(side));
        }
    }

    pub fn hide_all(&mut self) {
        for id in HandleId::ALL {
            let handle = self.handle_mut(id);
            handle.hide();
            handle.reset_role();
        }
        self.caret_at_press = None;
        self.last_index = None;
    }

    /// Whether a handle belongs on screen: held handles always do, others only
    /// while they overlap the slightly enlarged viewport.
    pub fn should_be_visible(handle: &DragHandle, geometry: &FieldGeometry) -> bool {
        if handle.is_held() {
            return true;
        }
        let viewport = geometry.viewport.scaled_about_center(VISIBILITY_MARGIN_SCALE);
        viewport.intersects(&geometry.rect_to_screen(handle.rect()))
    }

    /// Topmost visible handle under `screen`.
    pub fn hit_test(&self, screen: Vec2, geometry: &FieldGeometry) -> Option<HandleId> {
        [HandleId::Caret, HandleId::End, HandleId::Start]
            .into_iter()
            .find(|id| {
                let handle = self.handle(*id);
                handle.is_visible() && geometry.rect_to_screen(handle.rect()).contains(screen)
            })
    }

    /// Starts dragging `id` from the screen point `pointer`.
    pub fn press(
        &mut self,
        id: HandleId,
        pointer: Vec2,
        selection: Selection,
        layout: &dyn TextLayoutProvider,
        geometry: &FieldGeometry,
    ) {
        if self.held().is_some() {
            log::debug!("ignoring press on {id:?}: another handle is held");
            return;
        }
        let handle = self.handle_mut(id);
        if !handle.is_visible() {
            return;
        }
        // Keep the pointer's offset to the anchor, aimed at the middle of the
        // line above the handle rather than its bottom edge.
        let local = geometry.to_text_local(pointer);
        let half_line = layout.line_info(0).height / 2.0;
        let grab_offset = handle.position() - local - Vec2::new(0.0, half_line);
        handle.press(grab_offset);
        self.caret_at_press = (id == HandleId::Caret).then_some(selection.caret);
        self.last_index = None;
    }

    /// Moves the held handle `id` to follow `pointer` and pushes the
    /// resulting index into `model`.
    ///
    /// Dragging a range handle past the opposite bound swaps the roles of the
    /// two handles so the selection stays ordered.
    pub fn drag(
        &mut self,
        id: HandleId,
        pointer: Vec2,
        model: &SelectionModel,
        layout: &dyn TextLayoutProvider,
        geometry: &FieldGeometry,
    ) -> EditResult<()> {
        if !self.handle(id).is_held() {
            return Ok(());
        }
        let selection = model.get();
        let fallback = self.last_index.unwrap_or(match self.handle(id).role() {
            HandleRole::Start => selection.start,
            HandleRole::End => selection.end,
            HandleRole::Caret => selection.caret,
        });

        let query = geometry.to_text_local(pointer) + self.handle(id).grab_offset();
        let index = resolve_index(layout, query, fallback);
        self.last_index = Some(index);

        let half_line = layout.line_info(0).height / 2.0;
        let handle = self.handle_mut(id);
        handle.set_out_of_bounds(!geometry.viewport.contains(pointer));
        handle.update_position(query + Vec2::new(0.0, half_line));
        handle.set_target(handle_anchor(layout, index));

        match handle.role() {
            HandleRole::Caret => model.set_caret_with(index, ChangeOrigin::Drag),
            HandleRole::Start => {
                if index <= selection.end {
                    model.set_bounds(index, selection.end, index, ChangeOrigin::Drag)
                } else {
                    log::debug!("start handle crossed end at {index}; swapping roles");
                    handle.set_role(HandleRole::End);
                    self.other_range_handle(id).set_role(HandleRole::Start);
                    model.set_bounds(selection.end, index, index, ChangeOrigin::Drag)
                }
            }
            HandleRole::End => {
                if index >= selection.start {
                    model.set_bounds(selection.start, index, index, ChangeOrigin::Drag)
                } else {
                    log::debug!("end handle crossed start at {index}; swapping roles");
                    handle.set_role(HandleRole::Start);
                    self.other_range_handle(id).set_role(HandleRole::End);
                    model.set_bounds(index, selection.start, index, ChangeOrigin::Drag)
                }
            }
        }
    }

    fn other_range_handle(&mut self, id: HandleId) -> &mut DragHandle {
        match id {
            HandleId::Start => &mut self.end,
            _ => &mut self.start,
        }
    }

    /// Lets go of `id`. A caret handle released over the caret it was pressed
    /// on reports [`HandleRelease::Tap`].
    pub fn release(&mut self, id: HandleId, selection: Selection) -> HandleRelease {
        let handle = self.handle_mut(id);
        if !handle.is_held() {
            return HandleRelease::Ignored;
        }
        handle.release();
        handle.set_out_of_bounds(false);
        self.last_index = None;
        match self.caret_at_press.take() {
            Some(caret) if id == HandleId::Caret && caret == selection.caret => HandleRelease::Tap,
            _ => HandleRelease::Moved,
        }
    }

    /// Places and shows or hides every handle for `selection`.
    ///
    /// Range handles are shown while there is a selection or one of them is
    /// held; otherwise only the caret handle is, unless suppressed.
    pub fn refresh(&mut self, selection: Selection, layout: &dyn TextLayoutProvider, geometry: &FieldGeometry) {
        if !self.enabled || self.owner.is_none() {
            return;
        }
        let range_held = self.start.is_held() || self.end.is_held();

        if selection.has_selection() || range_held {
            for id in [HandleId::Start, HandleId::End] {
                let handle = self.handle_mut(id);
                let bound = match handle.role() {
                    HandleRole::Start => selection.start,
                    _ => selection.end,
                };
                place(handle, handle_anchor(layout, bound));
                if Self::should_be_visible(handle, geometry) {
                    handle.show();
                } else {
                    handle.hide();
                }
            }
            self.caret.hide();
        } else {
            self.start.hide();
            self.end.hide();
            self.start.reset_role();
            self.end.reset_role();
            place(&mut self.caret, handle_anchor(layout, selection.caret));
            if self.caret_suppressed || !Self::should_be_visible(&self.caret, geometry) {
                self.caret.hide();
            } else {
                self.caret.show();
            }
        }
    }

    /// Steps handle animations. When a range handle finishes settling its
    /// role is restored and both range handles snap to the selection.
    pub fn advance(
        &mut self,
        dt: Duration,
        selection: Selection,
        layout: &dyn TextLayoutProvider,
        geometry: &FieldGeometry,
    ) {
        let mut range_settled = false;
        for id in HandleId::ALL {
            let settled = self.handle_mut(id).advance(dt);
            range_settled |= settled && id != HandleId::Caret;
        }
        if range_settled {
            self.start.reset_role();
            self.end.reset_role();
            for (handle, bound) in [(&mut self.start, selection.start), (&mut self.end, selection.end)] {
                handle.update_position(handle_anchor(layout, bound));
            }
            self.refresh(selection, layout, geometry);
        }
    }
}

/// Anchors an idle handle, or retargets one that is settling or held.
fn place(handle: &mut DragHandle, anchor: Vec2) {
    if handle.is_held() || handle.is_settling() {
        handle.set_target(anchor);
    } else {
        handle.update_position(anchor);
    }
}
