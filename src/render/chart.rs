use crate::config::ChartSettings;
use crate::error::LineageResult;
use crate::lineage::LineageTracker;
use crate::render::formatters::escape_xml;
use crate::types::GenerationFitness;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

const MARGIN: f64 = 60.0;

/// Average fitness per generation, ready to plot as a line chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<GenerationFitness>,
}

impl FitnessChart {
    pub fn from_tracker(tracker: &LineageTracker, settings: &ChartSettings) -> LineageResult<Self> {
        Ok(Self {
            title: settings.title.clone(),
            x_label: settings.x_label.clone(),
            y_label: settings.y_label.clone(),
            points: tracker.fitness_by_generation()?,
        })
    }

    pub fn to_csv(&self) -> String {
        let mut csv = String::from("generation,average_fitness,individuals\n");
        for point in &self.points {
            csv.push_str(&format!(
                "{},{},{}\n",
                point.generation, point.average_fitness, point.individuals
            ));
        }
        csv
    }

    /// Line chart with markers, grid and legend
    pub fn to_svg(&self, settings: &ChartSettings) -> Result<String> {
        let width = settings.width as f64;
        let height = settings.height as f64;
        let plot_width = width - 2.0 * MARGIN;
        let plot_height = height - 2.0 * MARGIN;

        // Infinite or NaN averages have no place on the axis
        let plotted: Vec<&GenerationFitness> = self
            .points
            .iter()
            .filter(|point| point.average_fitness.is_finite())
            .collect();

        let (min_x, max_x) = span(plotted.iter().map(|p| p.generation as f64));
        let (min_y, max_y) = span(plotted.iter().map(|p| p.average_fitness));
        let project = |point: &GenerationFitness| {
            (
                MARGIN + (point.generation as f64 - min_x) / (max_x - min_x) * plot_width,
                MARGIN + (1.0 - (point.average_fitness - min_y) / (max_y - min_y)) * plot_height,
            )
        };

        let mut svg = String::new();
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = settings.width,
            h = settings.height
        )?;
        writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#)?;

        // Grid: five divisions per axis
        for step in 0..=5 {
            let fraction = step as f64 / 5.0;
            let x = MARGIN + fraction * plot_width;
            let y = MARGIN + fraction * plot_height;
            writeln!(
                svg,
                r##"  <line x1="{x:.1}" y1="{top:.1}" x2="{x:.1}" y2="{bottom:.1}" stroke="#dddddd"/>"##,
                top = MARGIN,
                bottom = MARGIN + plot_height
            )?;
            writeln!(
                svg,
                r##"  <line x1="{left:.1}" y1="{y:.1}" x2="{right:.1}" y2="{y:.1}" stroke="#dddddd"/>"##,
                left = MARGIN,
                right = MARGIN + plot_width
            )?;
            writeln!(
                svg,
                r#"  <text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">{:.2}</text>"#,
                MARGIN - 6.0,
                y + 3.0,
                max_y - fraction * (max_y - min_y)
            )?;
        }

        let points: Vec<String> = plotted
            .iter()
            .map(|&point| {
                let (x, y) = project(point);
                format!("{:.1},{:.1}", x, y)
            })
            .collect();
        writeln!(
            svg,
            r##"  <polyline points="{}" fill="none" stroke="#1f77b4" stroke-width="2"/>"##,
            points.join(" ")
        )?;

        for &point in &plotted {
            let (x, y) = project(point);
            writeln!(
                svg,
                r##"  <circle cx="{:.1}" cy="{:.1}" r="4" fill="#1f77b4"><title>generation {}: {:.3}</title></circle>"##,
                x, y, point.generation, point.average_fitness
            )?;
            writeln!(
                svg,
                r#"  <text x="{:.1}" y="{:.1}" font-size="10" text-anchor="middle">{}</text>"#,
                x,
                MARGIN + plot_height + 14.0,
                point.generation
            )?;
        }

        writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" font-size="18" text-anchor="middle">{}</text>"#,
            width / 2.0,
            MARGIN / 2.0,
            escape_xml(&self.title)
        )?;
        writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle">{}</text>"#,
            width / 2.0,
            height - 12.0,
            escape_xml(&self.x_label)
        )?;
        writeln!(
            svg,
            r#"  <text x="14" y="{:.1}" font-size="12" text-anchor="middle" transform="rotate(-90 14 {:.1})">{}</text>"#,
            height / 2.0,
            height / 2.0,
            escape_xml(&self.y_label)
        )?;
        writeln!(
            svg,
            r##"  <g class="legend"><line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#1f77b4" stroke-width="2"/><text x="{:.1}" y="{:.1}" font-size="11">Average Fitness</text></g>"##,
            width - MARGIN - 130.0,
            MARGIN + 12.0,
            width - MARGIN - 110.0,
            MARGIN + 12.0,
            width - MARGIN - 104.0,
            MARGIN + 16.0
        )?;

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

/// Axis range, widened around a single value so projection never divides by zero
fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
        (min.min(value), max.max(value))
    });
    if !min.is_finite() || !max.is_finite() {
        (0.0, 1.0)
    } else if max - min > f64::EPSILON {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LineageError;
    use crate::types::Individual;

    fn create_tracker() -> LineageTracker {
        let mut tracker = LineageTracker::new();
        tracker.add_individual(Individual::new(2.0), &[], None, Some(0)).unwrap();
        tracker.add_individual(Individual::new(4.0), &[], None, Some(0)).unwrap();
        tracker.add_individual(Individual::new(9.0), &[0, 1], None, Some(1)).unwrap();
        tracker
    }

    #[test]
    fn test_chart_from_tracker() {
        let chart = FitnessChart::from_tracker(&create_tracker(), &ChartSettings::default()).unwrap();

        assert_eq!(chart.title, "Fitness Over Generations");
        assert_eq!(chart.x_label, "Generation");
        assert_eq!(chart.y_label, "Average Fitness");
        assert_eq!(chart.points.len(), 2);
    }

    #[test]
    fn test_chart_requires_individuals() {
        let result = FitnessChart::from_tracker(&LineageTracker::new(), &ChartSettings::default());
        assert_eq!(result, Err(LineageError::EmptyGraph));
    }

    #[test]
    fn test_chart_csv() {
        let chart = FitnessChart::from_tracker(&create_tracker(), &ChartSettings::default()).unwrap();
        assert_eq!(
            chart.to_csv(),
            "generation,average_fitness,individuals\n0,3,2\n1,9,1\n"
        );
    }

    #[test]
    fn test_chart_svg() {
        let settings = ChartSettings::default();
        let chart = FitnessChart::from_tracker(&create_tracker(), &settings).unwrap();
        let svg = chart.to_svg(&settings).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<polyline points=\"60.0,540.0 940.0,60.0\""));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("Fitness Over Generations"));
        assert!(svg.contains("Average Fitness</text></g>"));
    }

    #[test]
    fn test_single_generation_chart_is_finite() {
        let mut tracker = LineageTracker::new();
        tracker.add_individual(Individual::new(1.0), &[], None, None).unwrap();
        let settings = ChartSettings::default();
        let svg = FitnessChart::from_tracker(&tracker, &settings)
            .unwrap()
            .to_svg(&settings)
            .unwrap();

        assert!(!svg.contains("NaN"));
        assert!(svg.contains("<polyline points=\"500.0,300.0\""));
    }

    #[test]
    fn test_non_finite_average_is_not_plotted() {
        let mut tracker = LineageTracker::new();
        tracker.add_individual(Individual::new(1.0), &[], None, Some(0)).unwrap();
        tracker.add_individual(Individual::new(3.0), &[0], None, Some(1)).unwrap();
        tracker
            .add_individual(Individual::new(f64::INFINITY), &[1], None, Some(2))
            .unwrap();
        let settings = ChartSettings::default();
        let svg = FitnessChart::from_tracker(&tracker, &settings)
            .unwrap()
            .to_svg(&settings)
            .unwrap();

        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("<polyline points=\"60.0,540.0 940.0,60.0\""));
    }
}
