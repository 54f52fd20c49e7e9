fn main() -> anyhow::Result<()> {
    fleet_diorama::app::run()
}
