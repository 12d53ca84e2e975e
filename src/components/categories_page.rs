//! Categories Page
//!
//! Outline of the taxonomy with create / rename / delete and drag
//! reordering inside one sibling group.

use dragdrop::{DragTracker, DropLocation};
use phrasebank_lib::commands;
use phrasebank_lib::domain::{Category, CategoryLevel, LargeNode, ReorderPlan, SiblingScope};

use crate::context::AppContext;
use crate::store::Notice;
use crate::tree::{outline_rows, TreeRow};

#[derive(Debug, Clone, Default)]
pub struct CategoriesPage {
    rows: Vec<TreeRow>,
    drag: DragTracker<SiblingScope>,
    pub selected: Option<u32>,
    pub notice: Option<Notice>,
}

impl CategoriesPage {
    pub fn new(forest: &[LargeNode]) -> Self {
        let mut page = Self::default();
        page.sync(forest);
        page
    }

    /// Rebuild rows from a freshly loaded tree
    pub fn sync(&mut self, forest: &[LargeNode]) {
        self.rows = outline_rows(forest);
        if let Some(id) = self.selected {
            if !self.rows.iter().any(|r| r.category.id == id) {
                self.selected = None;
            }
        }
    }

    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    fn location(row: &TreeRow) -> DropLocation<SiblingScope> {
        DropLocation::new(row.scope, row.index)
    }

    /// Pointer down on a row
    pub fn press(&mut self, row: usize, x: i32, y: i32) {
        if let Some(r) = self.rows.get(row) {
            self.drag.press(r.category.id, Self::location(r), x, y);
        }
    }

    pub fn move_to(&mut self, x: i32, y: i32) -> bool {
        self.drag.move_to(x, y)
    }

    /// Pointer over a row while dragging
    pub fn hover(&mut self, row: usize) {
        match self.rows.get(row) {
            Some(r) => self.drag.hover(Self::location(r)),
            None => self.drag.leave(),
        }
    }

    /// Pointer up. A move inside the source group is persisted and the tree
    /// reload is triggered; anything else is ignored.
    pub async fn release(&mut self, ctx: &AppContext) -> Result<Option<ReorderPlan>, Notice> {
        let Some(mv) = self.drag.release().and_then(|result| result.as_list_move()) else {
            return Ok(None);
        };
        let outcome = commands::reorder_categories(
            &ctx.state,
            mv.draggable_id,
            mv.droppable_id,
            mv.from,
            mv.droppable_id,
            mv.to,
        )
        .await;
        match outcome {
            Ok(plan) => {
                if plan.is_some() {
                    ctx.reload();
                }
                Ok(plan)
            }
            Err(e) => {
                // Stale view: reload so the next drag starts from the stored order
                ctx.reload();
                Err(self.alert(e.into()))
            }
        }
    }

    /// Click on a row; the click that ends a drag is swallowed
    pub fn click(&mut self, row: usize) {
        if self.drag.drag_just_ended() {
            self.drag.clear_just_ended();
            return;
        }
        self.selected = self.rows.get(row).map(|r| r.category.id);
    }

    /// Press, drag past the threshold and drop on another row in one go
    pub async fn drag_row(&mut self, ctx: &AppContext, from: usize, to: usize) -> Result<Option<ReorderPlan>, Notice> {
        self.press(from, 0, 0);
        self.move_to(0, 20);
        self.hover(to);
        let result = self.release(ctx).await;
        self.drag.clear_just_ended();
        result
    }

    fn alert(&mut self, notice: Notice) -> Notice {
        self.notice = Some(notice.clone());
        notice
    }

    pub async fn add(
        &mut self,
        ctx: &AppContext,
        name: &str,
        level: CategoryLevel,
        parent_id: Option<u32>,
    ) -> Result<Category, Notice> {
        match commands::create_category(&ctx.state, name.to_string(), level, parent_id, None).await {
            Ok(category) => {
                ctx.reload();
                self.notice = None;
                Ok(category)
            }
            Err(e) => Err(self.alert(e.into())),
        }
    }

    pub async fn rename(&mut self, ctx: &AppContext, id: u32, name: &str) -> Result<Category, Notice> {
        match commands::update_category(&ctx.state, id, Some(name.to_string()), None).await {
            Ok(category) => {
                ctx.reload();
                self.notice = None;
                Ok(category)
            }
            Err(e) => Err(self.alert(e.into())),
        }
    }

    pub async fn remove(&mut self, ctx: &AppContext, id: u32) -> Result<(), Notice> {
        match commands::delete_category(&ctx.state, id).await {
            Ok(()) => {
                ctx.reload();
                self.notice = None;
                Ok(())
            }
            Err(e) => Err(self.alert(e.into())),
        }
    }

    pub fn render(&self) -> String {
        let mut out = vec!["Categories".to_string()];
        if let Some(notice) = &self.notice {
            out.push(format!("! {}", notice.text()));
        }
        if self.rows.is_empty() {
            out.push("(no categories)".to_string());
        }
        for (i, row) in self.rows.iter().enumerate() {
            let marker = if self.selected == Some(row.category.id) { '>' } else { ' ' };
            out.push(format!(
                "{}{:>3}. {}[{}] {} (#{}, order {})",
                marker,
                i,
                "  ".repeat(row.depth),
                row.category.level.as_str(),
                row.category.name,
                row.category.id,
                row.category.order
            ));
        }
        out.join("\n")
    }
}
