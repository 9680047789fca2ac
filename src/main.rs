use probe_view::ViewerConfig;

fn main() -> anyhow::Result<()> {
    probe_view::run(ViewerConfig::default())
}
