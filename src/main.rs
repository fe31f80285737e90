fn main() -> anyhow::Result<()> {
    datapack_lower::run()
}
