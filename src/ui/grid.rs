use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};

/// Columns and rows needed to lay `cardinality` cells out as a near-square grid
pub fn dimensions(cardinality: u32) -> (u16, u16) {
    let cardinality = cardinality.max(1);
    let cols = (cardinality as f64).sqrt().ceil() as u32;
    let rows = cardinality.div_ceil(cols);
    (cols as u16, rows as u16)
}

/// Row and column of the cell for stimulus `value`
pub fn position(value: u32, cols: u16) -> (u16, u16) {
    let cols = u32::from(cols.max(1));
    ((value / cols) as u16, (value % cols) as u16)
}

/// Visual stimulus display: one cell per stimulus, the current one lit
pub struct Grid {
    pub cardinality: u32,
    pub lit: Option<u32>,
}

impl Widget for Grid {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (cols, rows) = dimensions(self.cardinality);

        // terminal cells are about twice as tall as they are wide
        let mut cell_w = area.width / cols;
        let mut cell_h = area.height / rows;
        cell_h = cell_h.min(cell_w / 2);
        cell_w = cell_w.min(cell_h * 2);
        if cell_w < 2 || cell_h < 2 {
            return;
        }

        let x0 = area.x + (area.width - cell_w * cols) / 2;
        let y0 = area.y + (area.height - cell_h * rows) / 2;

        let idle = Style::default().fg(Color::DarkGray);
        let lit = Style::default()
            .fg(Color::Cyan)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        for value in 0..self.cardinality {
            let (row, col) = position(value, cols);
            let rect = Rect::new(x0 + col * cell_w, y0 + row * cell_h, cell_w, cell_h);
            let style = if self.lit == Some(value) { lit } else { idle };
            Block::default()
                .borders(Borders::ALL)
                .style(style)
                .render(rect, buf);
        }
    }
}
