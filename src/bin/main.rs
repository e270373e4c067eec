fn main() {
  doctor::main()
}
