// Canvas rendering of a draw plan
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::board::{Bounds, DrawPlan, Shape};

const MARKER_LINE_WIDTH: f64 = 2.0;
const SELF_OUTLINE_WIDTH: f64 = 1.0;

pub struct Renderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    background: String,
}

impl Renderer {
    pub fn new(canvas: HtmlCanvasElement, background: &str) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or("Failed to get 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(Self {
            canvas,
            ctx,
            background: background.to_string(),
        })
    }

    #[inline(always)]
    pub fn width(&self) -> f64 {
        self.canvas.width() as f64
    }

    #[inline(always)]
    pub fn height(&self) -> f64 {
        self.canvas.height() as f64
    }

    /// Size the canvas to the board. Only touches the element when the size
    /// actually changes, since resizing also clears it.
    pub fn fit(&self, rows: usize, cols: usize, cell_size: f32) {
        let width = (cols as f32 * cell_size).ceil() as u32;
        let height = (rows as f32 * cell_size).ceil() as u32;
        if width == 0 || height == 0 {
            return;
        }
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }
    }

    #[inline]
    pub fn clear(&self) {
        self.ctx.set_fill_style_str(&self.background);
        self.ctx.fill_rect(0.0, 0.0, self.width(), self.height());
    }

    /// Repaint the whole frame. Plan order is paint order.
    pub fn draw(&self, plan: &DrawPlan) {
        self.clear();
        for drawable in &plan.entities {
            match drawable.shape {
                Shape::Block {
                    color,
                    opacity,
                    is_self,
                    ..
                } => {
                    self.fill(&drawable.bounds, &color.css(opacity));
                    if is_self {
                        self.outline(&drawable.bounds, "rgba(255,255,255,0.8)");
                    }
                }
                Shape::DeathMarker { color } => self.cross(&drawable.bounds, &color.css(1.0)),
            }
        }
    }

    fn fill(&self, bounds: &Bounds, style: &str) {
        self.ctx.set_fill_style_str(style);
        self.ctx.fill_rect(
            bounds.origin.x as f64,
            bounds.origin.y as f64,
            bounds.size.x as f64,
            bounds.size.y as f64,
        );
    }

    fn outline(&self, bounds: &Bounds, style: &str) {
        let inset = SELF_OUTLINE_WIDTH / 2.0;
        self.ctx.set_stroke_style_str(style);
        self.ctx.set_line_width(SELF_OUTLINE_WIDTH);
        self.ctx.stroke_rect(
            bounds.origin.x as f64 + inset,
            bounds.origin.y as f64 + inset,
            bounds.size.x as f64 - SELF_OUTLINE_WIDTH,
            bounds.size.y as f64 - SELF_OUTLINE_WIDTH,
        );
    }

    fn cross(&self, bounds: &Bounds, style: &str) {
        let min = bounds.origin;
        let max = bounds.max();
        self.ctx.set_stroke_style_str(style);
        self.ctx.set_line_width(MARKER_LINE_WIDTH);
        self.ctx.begin_path();
        self.ctx.move_to(min.x as f64, min.y as f64);
        self.ctx.line_to(max.x as f64, max.y as f64);
        self.ctx.move_to(max.x as f64, min.y as f64);
        self.ctx.line_to(min.x as f64, max.y as f64);
        self.ctx.stroke();
    }
}
