fn main() -> anyhow::Result<()> {
    imgnav::run()
}
