/// Diagnostic tool to verify the CSV → dataset → layout pipeline.
/// Takes the same flags as `waffle-rank`.
use waffle_rank::cli::Args;
use waffle_rank::dataset;
use waffle_rank::layout::{layout, BoundingBox};

fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive("waffle_rank=debug".parse()?);
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(filter).init();

    let args = Args::parse_env();
    let source = &args.source;
    let maxrank = args.maxrank;
    let config = args.chart_config();
    let (width, height) = config.canvas_size();

    println!("=== DIAGNOSTIC: CSV → Layout Pipeline ===");
    println!("Source: {}", source.display());

    let dataset = dataset::load_path(source, &args.load_options())?;
    println!(
        "\n[1] Dataset loaded: {} entrants, {} waffles total",
        dataset.len(),
        dataset.total_count()
    );

    println!("\n[2] Top {} entrants:", maxrank.min(dataset.len() as u32));
    for record in dataset.view(maxrank) {
        println!("    #{:<3} {:<24} {}", record.rank, record.name, record.count);
    }

    let bbox = BoundingBox::sized(width, height);
    let tiles = layout(&dataset, maxrank, bbox, &config.layout)?;
    println!("\n[3] Layout computed: {} tiles in {}x{}", tiles.len(), width, height);

    let view_total: u64 = dataset.view(maxrank).iter().map(|r| r.count).sum();
    for tile in &tiles {
        let expected = bbox.area() * tile.record.count as f64 / view_total as f64;
        let aspect = tile.width.max(tile.height) / tile.width.min(tile.height);
        println!(
            "    #{:<3} {:.1}x{:.1} at ({:.1}, {:.1}) area {:.0}px² (expected {:.0}, aspect {:.2})",
            tile.record.rank,
            tile.width,
            tile.height,
            tile.x,
            tile.y,
            tile.area(),
            expected,
            aspect
        );
    }

    println!("\n[4] Checking for anomalies:");
    let area_sum: f64 = tiles.iter().map(|t| t.area()).sum();
    println!("    Total tile area: {:.0}px²", area_sum);
    println!("    Box area:        {:.0}px²", bbox.area());
    println!("    Coverage: {:.4}%", area_sum / bbox.area() * 100.0);

    let mut overlaps = 0;
    for (i, a) in tiles.iter().enumerate() {
        for b in &tiles[i + 1..] {
            let ox = (a.x + a.width).min(b.x + b.width) - a.x.max(b.x);
            let oy = (a.y + a.height).min(b.y + b.height) - a.y.max(b.y);
            if ox > 1e-6 && oy > 1e-6 {
                overlaps += 1;
                println!("    overlap: #{} and #{}", a.record.rank, b.record.rank);
            }
        }
    }
    println!("    Overlapping pairs: {}", overlaps);

    Ok(())
}
